mod router;
mod router_command;

pub use router::*;
pub use router_command::*;
