//! Client side of a mesh call: one peer connection per remote participant,
//! negotiated through the relay.

mod client;
mod config;
mod error;
pub mod media;
pub mod orchestrator;
pub mod peer;
pub mod rtc;
pub mod session;
pub mod signaling;

pub use client::{Client, ClientHandle};
pub use config::ClientConfig;
pub use error::{ClientError, SessionError};
pub use orchestrator::{
    ClientCommand, ClientEvent, LocalParticipant, Orchestrator, SessionSnapshot, UiEvent,
};
