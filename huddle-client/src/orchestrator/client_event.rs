use huddle_core::{ParticipantId, ServerMessage};
use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::media::{LocalTrack, MediaDevice};
use crate::peer::PeerEvent;
use crate::session::{SessionRole, SessionState};

/// Everything the orchestrator reacts to.
#[derive(Debug)]
pub enum ClientEvent {
    /// A message from the relay.
    Signal(ServerMessage),
    /// A callback from one of the peer connections.
    Peer(PeerEvent),
    /// A request from the local user.
    Command(ClientCommand),
    /// Periodic check for sessions stuck in negotiation.
    Sweep,
}

/// Requests from the local user, sent through [`crate::ClientHandle`].
#[derive(Debug)]
pub enum ClientCommand {
    ReplaceOutboundVideo {
        track: LocalTrack,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    SwitchCamera {
        device_id: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    ListCameras {
        reply: oneshot::Sender<Result<Vec<MediaDevice>, ClientError>>,
    },
    ToggleAudio {
        reply: oneshot::Sender<bool>,
    },
    ToggleVideo {
        reply: oneshot::Sender<bool>,
    },
    SendChat {
        text: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    /// Answered once every session is closed and the relay has been told.
    LeaveRoom {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<SessionSnapshot>>,
    },
}

/// Read-only view of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub remote_id: ParticipantId,
    pub remote_nickname: String,
    pub role: SessionRole,
    pub state: SessionState,
    pub pending_candidates: usize,
}
