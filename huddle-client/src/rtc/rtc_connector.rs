use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, ParticipantId};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;

use crate::media::{LocalTrack, TrackKind};
use crate::peer::{
    PeerConnection, PeerConnectionState, PeerConnector, PeerEvent, PeerEventKind, RemoteStream,
    RemoteTrack, SdpKind, SessionDescription,
};

/// Builds `RTCPeerConnection`s sharing one media engine.
pub struct RtcConnector {
    api: API,
}

impl RtcConnector {
    pub fn new() -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api })
    }
}

#[async_trait]
impl PeerConnector for RtcConnector {
    async fn connect(
        &self,
        remote_id: ParticipantId,
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(self.api.new_peer_connection(rtc_config).await?);

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                info!("Peer connection state with {}: {:?}", remote_id, s);
                let state = match s {
                    RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
                    RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
                    RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
                    RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
                    RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
                    _ => PeerConnectionState::New,
                };
                let _ = state_tx.send(PeerEvent {
                    remote_id,
                    kind: PeerEventKind::ConnectionState(state),
                });
                Box::pin(async {})
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(PeerEvent {
                    remote_id,
                    kind: PeerEventKind::IceCandidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                    }),
                });
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                debug!("Remote {:?} track from {}", kind, remote_id);

                let _ = tx.send(PeerEvent {
                    remote_id,
                    kind: PeerEventKind::RemoteStream(RemoteStream {
                        stream_id: track.stream_id(),
                        tracks: vec![RemoteTrack {
                            id: track.id(),
                            kind,
                        }],
                    }),
                });

                // Nothing renders here; keep the receive buffers drained.
                tokio::spawn(async move { while track.read_rtp().await.is_ok() {} });
            })
        }));

        Ok(Arc::new(RtcPeer {
            remote_id,
            peer_connection,
            video_sender: Mutex::new(None),
        }))
    }
}

/// One `RTCPeerConnection` to one remote participant.
pub struct RtcPeer {
    pub remote_id: ParticipantId,
    pub peer_connection: Arc<RTCPeerConnection>,
    video_sender: Mutex<Option<Arc<RTCRtpSender>>>,
}

impl RtcPeer {
    fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription> {
        let rtc = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        Ok(rtc)
    }
}

#[async_trait]
impl PeerConnection for RtcPeer {
    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        let Some(sink) = track.sink() else {
            bail!("track {} has no media behind it", track.id());
        };
        let local: Arc<dyn TrackLocal + Send + Sync> = sink.clone();
        let sender = self.peer_connection.add_track(local).await?;

        if track.kind() == TrackKind::Video {
            *self.video_sender.lock().await = Some(sender.clone());
        }

        // RTCP has to be read for interceptors like NACK to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while sender.read(&mut rtcp_buf).await.is_ok() {}
        });
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(Self::to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(Self::to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .with_context(|| format!("rejected ICE candidate from {}", self.remote_id))?;
        Ok(())
    }

    async fn replace_video_track(&self, track: &LocalTrack) -> Result<()> {
        let Some(sink) = track.sink() else {
            bail!("track {} has no media behind it", track.id());
        };
        let Some(sender) = self.video_sender.lock().await.clone() else {
            bail!("no outbound video to {}", self.remote_id);
        };
        let local: Arc<dyn TrackLocal + Send + Sync> = sink.clone();
        sender.replace_track(Some(local)).await?;
        Ok(())
    }

    async fn outbound_video_track_id(&self) -> Option<String> {
        let sender = self.video_sender.lock().await.clone()?;
        let track = sender.track().await?;
        Some(track.id().to_owned())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
