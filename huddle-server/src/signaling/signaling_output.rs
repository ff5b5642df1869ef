use async_trait::async_trait;
use huddle_core::{ParticipantId, ServerMessage, SignalingError};

/// Outbound half of the transport, as seen by the router.
///
/// Implemented by the WebSocket layer; tests substitute a recording mock.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver one message to one participant.
    ///
    /// Fails with [`SignalingError::RoutingMiss`] when the participant is not connected.
    async fn send(&self, participant_id: ParticipantId, message: ServerMessage)
    -> Result<(), SignalingError>;
}
