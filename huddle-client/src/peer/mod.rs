//! Seam between the orchestrator and a WebRTC stack.

use std::sync::Arc;

use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, ParticipantId};
use tokio::sync::mpsc;

use crate::media::{LocalTrack, TrackKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// An SDP blob. Never parsed on this side, only handed to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// Media arriving from a remote participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub tracks: Vec<RemoteTrack>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerEventKind {
    /// A local candidate was gathered and must be trickled to the remote side.
    IceCandidate(IceCandidate),
    RemoteStream(RemoteStream),
    ConnectionState(PeerConnectionState),
}

/// Callback from a connection, tagged with the remote it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerEvent {
    pub remote_id: ParticipantId,
    pub kind: PeerEventKind,
}

/// One peer connection to one remote participant.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> anyhow::Result<()>;

    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;

    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> anyhow::Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> anyhow::Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()>;

    /// Swaps the outbound video without renegotiating.
    async fn replace_video_track(&self, track: &LocalTrack) -> anyhow::Result<()>;

    async fn outbound_video_track_id(&self) -> Option<String>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// Creates peer connections. Events of every connection it makes go to `events`.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(
        &self,
        remote_id: ParticipantId,
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> anyhow::Result<Arc<dyn PeerConnection>>;
}
