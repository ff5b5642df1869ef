use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use huddle_client::media::{LocalTrack, TrackKind};
use huddle_client::peer::{
    PeerConnection, PeerConnectionState, PeerConnector, PeerEvent, PeerEventKind, RemoteStream,
    RemoteTrack, SessionDescription,
};
use huddle_core::{IceCandidate, IceServerConfig, ParticipantId};
use tokio::sync::{Mutex, mpsc};

/// Connector handing out [`MockPeerConnection`]s and keeping them for inspection.
#[derive(Clone, Default)]
pub struct MockPeerConnector {
    connections: Arc<Mutex<Vec<Arc<MockPeerConnection>>>>,
    fail_remote_descriptions: Arc<AtomicBool>,
}

impl MockPeerConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every connection made from now on rejects remote descriptions.
    pub fn fail_remote_descriptions(&self) {
        self.fail_remote_descriptions.store(true, Ordering::SeqCst);
    }

    /// Most recent connection made for `remote_id`.
    pub async fn connection_for(&self, remote_id: &ParticipantId) -> Option<Arc<MockPeerConnection>> {
        self.connections
            .lock()
            .await
            .iter()
            .rev()
            .find(|c| c.remote_id == *remote_id)
            .cloned()
    }

    pub async fn connections(&self) -> Vec<Arc<MockPeerConnection>> {
        self.connections.lock().await.clone()
    }
}

#[async_trait]
impl PeerConnector for MockPeerConnector {
    async fn connect(
        &self,
        remote_id: ParticipantId,
        _ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> anyhow::Result<Arc<dyn PeerConnection>> {
        let connection = Arc::new(MockPeerConnection {
            remote_id,
            events,
            fail_remote: self.fail_remote_descriptions.load(Ordering::SeqCst),
            reject_video: AtomicBool::new(false),
            state: Mutex::new(MockState::default()),
        });
        self.connections.lock().await.push(connection.clone());
        Ok(connection)
    }
}

#[derive(Default)]
struct MockState {
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    tracks: Vec<String>,
    video_track: Option<String>,
    applied: Vec<IceCandidate>,
    gathered: usize,
    connected: bool,
    closed: bool,
}

/// Scripted peer connection.
///
/// Gathers one local candidate per local description and reports a remote
/// stream plus `Connected` once both descriptions are set.
pub struct MockPeerConnection {
    pub remote_id: ParticipantId,
    events: mpsc::UnboundedSender<PeerEvent>,
    fail_remote: bool,
    reject_video: AtomicBool,
    state: Mutex<MockState>,
}

impl MockPeerConnection {
    /// From now on `replace_video_track` fails and leaves the sender alone.
    pub fn reject_video_swaps(&self) {
        self.reject_video.store(true, Ordering::SeqCst);
    }

    pub async fn applied_candidates(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .applied
            .iter()
            .map(|c| c.candidate.clone())
            .collect()
    }

    pub async fn tracks(&self) -> Vec<String> {
        self.state.lock().await.tracks.clone()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    pub async fn remote_description(&self) -> Option<SessionDescription> {
        self.state.lock().await.remote.clone()
    }

    fn emit(&self, kind: PeerEventKind) {
        let _ = self.events.send(PeerEvent {
            remote_id: self.remote_id,
            kind,
        });
    }

    fn maybe_connect(&self, state: &mut MockState) {
        if state.connected || state.local.is_none() || state.remote.is_none() {
            return;
        }
        state.connected = true;

        self.emit(PeerEventKind::RemoteStream(RemoteStream {
            stream_id: format!("stream-{}", self.remote_id),
            tracks: vec![
                RemoteTrack {
                    id: "remote-audio".into(),
                    kind: TrackKind::Audio,
                },
                RemoteTrack {
                    id: "remote-video".into(),
                    kind: TrackKind::Video,
                },
            ],
        }));
        self.emit(PeerEventKind::ConnectionState(PeerConnectionState::Connected));
    }
}

#[async_trait]
impl PeerConnection for MockPeerConnection {
    async fn add_track(&self, track: &LocalTrack) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.tracks.push(track.id().to_owned());
        if track.kind() == TrackKind::Video {
            state.video_track = Some(track.id().to_owned());
        }
        Ok(())
    }

    async fn create_offer(&self) -> anyhow::Result<SessionDescription> {
        Ok(SessionDescription::offer(format!("v=0 offer for {}", self.remote_id)))
    }

    async fn create_answer(&self) -> anyhow::Result<SessionDescription> {
        if self.state.lock().await.remote.is_none() {
            bail!("no remote offer");
        }
        Ok(SessionDescription::answer(format!("v=0 answer for {}", self.remote_id)))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.local = Some(desc);
        state.gathered += 1;
        self.emit(PeerEventKind::IceCandidate(IceCandidate::new(format!(
            "candidate:local-{}",
            state.gathered
        ))));
        self.maybe_connect(&mut state);
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> anyhow::Result<()> {
        if self.fail_remote {
            bail!("malformed remote description");
        }
        let mut state = self.state.lock().await;
        state.remote = Some(desc);
        self.maybe_connect(&mut state);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if state.remote.is_none() {
            bail!("candidate before remote description");
        }
        state.applied.push(candidate);
        Ok(())
    }

    async fn replace_video_track(&self, track: &LocalTrack) -> anyhow::Result<()> {
        if self.reject_video.load(Ordering::SeqCst) {
            bail!("sender refused track {}", track.id());
        }
        self.state.lock().await.video_track = Some(track.id().to_owned());
        Ok(())
    }

    async fn outbound_video_track_id(&self) -> Option<String> {
        self.state.lock().await.video_track.clone()
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.state.lock().await.closed = true;
        Ok(())
    }
}
