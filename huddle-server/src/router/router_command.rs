use huddle_core::{ClientMessage, ParticipantId};
use tokio::sync::oneshot;

/// Commands fed into the router task by the connection handlers.
#[derive(Debug)]
pub enum RouterCommand {
    /// The transport accepted a new connection.
    Connected { participant_id: ParticipantId },

    /// A parsed message arrived from a participant.
    Message {
        participant_id: ParticipantId,
        message: ClientMessage,
    },

    /// The transport lost the connection.
    Disconnected { participant_id: ParticipantId },

    /// Snapshot of the registry for the stats endpoint.
    Stats { reply: oneshot::Sender<RelayStats> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub participants: usize,
    pub rooms: usize,
}
