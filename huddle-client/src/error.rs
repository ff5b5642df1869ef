use std::time::Duration;

use huddle_core::{ParticipantId, SignalingError};
use thiserror::Error;

use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("illegal session transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("a session with {0} already exists")]
    Duplicate(ParticipantId),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("transport error: {0}")]
    Transport(String),

    /// Some sessions refused the new outbound video; the previous track is kept.
    #[error("video track rejected by {} session(s)", .rejected.len())]
    VideoSwapRejected { rejected: Vec<ParticipantId> },

    #[error("relay did not greet within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("invalid client config: {0}")]
    InvalidConfig(String),

    #[error("client task has stopped")]
    Stopped,
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
