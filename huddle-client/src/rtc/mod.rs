//! Native backend built on the `webrtc` crate.

mod rtc_connector;
mod sample_media;

pub use rtc_connector::*;
pub use sample_media::*;
