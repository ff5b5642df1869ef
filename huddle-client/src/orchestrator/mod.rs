mod client_event;
mod orchestrator;
mod ui_event;

pub use client_event::*;
pub use orchestrator::*;
pub use ui_event::*;
