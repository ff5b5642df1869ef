use thiserror::Error;

use crate::model::ParticipantId;

/// Failure taxonomy shared by the relay and the client.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Local capture failed (no device or permission denied).
    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),

    /// A negotiation message named a peer we have no session with.
    #[error("protocol violation from {remote_id}: {reason}")]
    ProtocolViolation {
        remote_id: ParticipantId,
        reason: String,
    },

    /// The relay could not resolve a target participant.
    #[error("no connected participant {0}")]
    RoutingMiss(ParticipantId),

    /// The peer connection rejected a session description.
    #[error("negotiation with {remote_id} failed: {reason}")]
    NegotiationFailure {
        remote_id: ParticipantId,
        reason: String,
    },

    #[error("invalid participant id: {0}")]
    InvalidParticipantId(String),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
