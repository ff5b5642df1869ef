use std::fmt::Display;
use std::sync::Arc;

use huddle_core::{
    ClientMessage, IceCandidate, IceServerConfig, ParticipantId, ServerMessage, SignalingError,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::media::{LocalMedia, LocalTrack, MediaConstraints, MediaDevice, MediaSource, TrackKind};
use crate::orchestrator::{ClientCommand, ClientEvent, SessionSnapshot, UiEvent};
use crate::peer::{
    PeerConnection, PeerConnectionState, PeerConnector, PeerEvent, PeerEventKind,
    SessionDescription,
};
use crate::session::{PeerSession, PeerSessionTable, SessionRole, SessionState};
use crate::signaling::SignalingSink;

/// What the orchestrator knows about the local side when it starts.
#[derive(Debug, Clone)]
pub struct LocalParticipant {
    pub id: ParticipantId,
    pub nickname: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub media: LocalMedia,
}

/// Client-side actor that keeps one peer connection per remote participant.
///
/// Owns the session table and the local media. Every input arrives as a
/// [`ClientEvent`] and is handled to completion before the next one, so the
/// table needs no locking.
pub struct Orchestrator {
    config: ClientConfig,
    local_id: ParticipantId,
    nickname: String,
    ice_servers: Vec<IceServerConfig>,
    sessions: PeerSessionTable,
    local_media: LocalMedia,
    connector: Arc<dyn PeerConnector>,
    media_source: Arc<dyn MediaSource>,
    signaling: Arc<dyn SignalingSink>,
    peer_tx: mpsc::UnboundedSender<PeerEvent>,
    peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    left: bool,
}

impl Orchestrator {
    pub fn new(
        config: ClientConfig,
        local: LocalParticipant,
        connector: Arc<dyn PeerConnector>,
        media_source: Arc<dyn MediaSource>,
        signaling: Arc<dyn SignalingSink>,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            config,
            local_id: local.id,
            nickname: local.nickname,
            ice_servers: local.ice_servers,
            sessions: PeerSessionTable::new(),
            local_media: local.media,
            connector,
            media_source,
            signaling,
            peer_tx,
            peer_rx,
            ui_tx,
            left: false,
        };
        (orchestrator, ui_rx)
    }

    pub fn local_id(&self) -> ParticipantId {
        self.local_id
    }

    pub fn sessions(&self) -> &PeerSessionTable {
        &self.sessions
    }

    pub fn local_media(&self) -> &LocalMedia {
        &self.local_media
    }

    pub fn has_left(&self) -> bool {
        self.left
    }

    /// Runs until the room is left, the relay goes away or every handle is dropped.
    pub async fn run(
        mut self,
        mut signal_rx: mpsc::UnboundedReceiver<ServerMessage>,
        mut command_rx: mpsc::Receiver<ClientCommand>,
    ) {
        info!(participant = %self.local_id, "Orchestrator event loop started");

        let mut sweep = tokio::time::interval(self.config.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.left {
            let event = tokio::select! {
                msg = signal_rx.recv() => match msg {
                    Some(m) => ClientEvent::Signal(m),
                    None => {
                        info!("Relay connection lost. Leaving room");
                        self.leave_room().await;
                        break;
                    }
                },

                Some(evt) = self.peer_rx.recv() => ClientEvent::Peer(evt),

                cmd = command_rx.recv() => match cmd {
                    Some(c) => ClientEvent::Command(c),
                    None => {
                        info!("All client handles dropped. Leaving room");
                        self.leave_room().await;
                        break;
                    }
                },

                _ = sweep.tick() => ClientEvent::Sweep,
            };

            self.handle_event(event).await;
        }

        info!(participant = %self.local_id, "Orchestrator event loop finished");
    }

    pub async fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Signal(message) => self.handle_signal(message).await,
            ClientEvent::Peer(event) => self.handle_peer_event(event).await,
            ClientEvent::Command(command) => self.handle_command(command).await,
            ClientEvent::Sweep => self.sweep_stalled(Instant::now()).await,
        }
    }

    /// Handles every peer event already queued by the connections.
    pub async fn drain_peer_events(&mut self) {
        while let Ok(event) = self.peer_rx.try_recv() {
            self.handle_peer_event(event).await;
        }
    }

    async fn handle_signal(&mut self, message: ServerMessage) {
        if self.left {
            debug!("Ignoring {:?} after leaving", message);
            return;
        }

        let result = match message {
            ServerMessage::Connected { participant_id, .. } => {
                debug!("Relay greeted us again as {}", participant_id);
                Ok(())
            }
            ServerMessage::Welcome {
                nickname,
                participant_id,
            } => self.on_remote_joined(participant_id, nickname).await,
            ServerMessage::Offer {
                sender_id,
                sdp,
                nickname,
            } => self.on_offer_received(sender_id, sdp, nickname).await,
            ServerMessage::Answer { sender_id, sdp } => {
                self.on_answer_received(sender_id, sdp).await
            }
            ServerMessage::IceCandidate {
                sender_id,
                candidate,
            } => self.on_ice_received(sender_id, candidate).await,
            ServerMessage::Chat {
                text,
                sender_nickname,
            } => {
                self.emit(UiEvent::ChatMessage {
                    from: Some(sender_nickname),
                    text,
                });
                Ok(())
            }
            ServerMessage::Leave { participant_id, .. } => {
                self.on_remote_left(participant_id).await;
                Ok(())
            }
            ServerMessage::Pong => Ok(()),
            ServerMessage::Error { message } => {
                warn!("Relay reported an error: {}", message);
                self.emit(UiEvent::RelayError { message });
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(SignalingError::ProtocolViolation { remote_id, reason }) => {
                warn!("Protocol violation from {}: {}", remote_id, reason);
            }
            Err(SignalingError::NegotiationFailure { remote_id, reason }) => {
                warn!("Negotiation with {} failed: {}", remote_id, reason);
                self.close_session(remote_id).await;
            }
            Err(SignalingError::RoutingMiss(remote_id)) => {
                debug!("No session for {}", remote_id);
            }
            Err(e) => error!("Failed to handle relay message: {}", e),
        }
    }

    /// A new member entered the room; we are the existing member, so we offer.
    pub async fn on_remote_joined(
        &mut self,
        remote_id: ParticipantId,
        nickname: String,
    ) -> Result<(), SignalingError> {
        if remote_id == self.local_id {
            return Ok(());
        }
        if self.sessions.contains(&remote_id) {
            return Err(violation(remote_id, "welcome for a known participant"));
        }

        info!(remote = %remote_id, nickname = nickname.as_str(), "Participant joined the room");
        self.emit(UiEvent::ParticipantJoined {
            remote_id,
            nickname: nickname.clone(),
        });

        let connection = self.open_connection(remote_id).await?;
        self.sessions
            .insert(PeerSession::new(
                remote_id,
                nickname,
                SessionRole::Offerer,
                connection.clone(),
            ))
            .map_err(|e| violation(remote_id, e))?;

        self.attach_local_tracks(remote_id, &connection).await?;

        let offer = connection
            .create_offer()
            .await
            .map_err(|e| failure(remote_id, e))?;
        connection
            .set_local_description(offer.clone())
            .await
            .map_err(|e| failure(remote_id, e))?;

        let Some(session) = self.live_session(&remote_id) else {
            return Ok(());
        };
        session
            .transition(SessionState::OfferSent)
            .map_err(|e| violation(remote_id, e))?;

        self.send_signal(ClientMessage::Offer {
            target_id: remote_id,
            sdp: offer.sdp,
            nickname: self.nickname.clone(),
        });
        Ok(())
    }

    pub async fn on_offer_received(
        &mut self,
        remote_id: ParticipantId,
        sdp: String,
        nickname: String,
    ) -> Result<(), SignalingError> {
        if remote_id == self.local_id {
            return Err(violation(remote_id, "offer from our own id"));
        }
        let existing = self.sessions.get_mut(&remote_id).map(|session| {
            session
                .transition(SessionState::OfferReceived)
                .map(|()| session.connection.clone())
        });

        let connection = match existing {
            Some(transitioned) => transitioned.map_err(|e| violation(remote_id, e))?,
            None => {
                let connection = self.open_connection(remote_id).await?;
                let mut session = PeerSession::new(
                    remote_id,
                    nickname,
                    SessionRole::Answerer,
                    connection.clone(),
                );
                session
                    .transition(SessionState::OfferReceived)
                    .map_err(|e| violation(remote_id, e))?;
                self.sessions
                    .insert(session)
                    .map_err(|e| violation(remote_id, e))?;

                self.attach_local_tracks(remote_id, &connection).await?;
                connection
            }
        };

        self.apply_remote_description(remote_id, &connection, SessionDescription::offer(sdp))
            .await?;

        let answer = connection
            .create_answer()
            .await
            .map_err(|e| failure(remote_id, e))?;
        connection
            .set_local_description(answer.clone())
            .await
            .map_err(|e| failure(remote_id, e))?;

        let Some(session) = self.live_session(&remote_id) else {
            return Ok(());
        };
        session
            .transition(SessionState::AnswerSent)
            .map_err(|e| violation(remote_id, e))?;

        self.send_signal(ClientMessage::Answer {
            target_id: remote_id,
            sdp: answer.sdp,
        });
        Ok(())
    }

    pub async fn on_answer_received(
        &mut self,
        remote_id: ParticipantId,
        sdp: String,
    ) -> Result<(), SignalingError> {
        let Some(session) = self.sessions.get_mut(&remote_id) else {
            return Err(violation(remote_id, "answer without a pending offer"));
        };
        if session.is_closed() {
            return Ok(());
        }
        session
            .transition(SessionState::AnswerReceived)
            .map_err(|e| violation(remote_id, e))?;
        let connection = session.connection.clone();

        self.apply_remote_description(remote_id, &connection, SessionDescription::answer(sdp))
            .await?;

        let Some(session) = self.live_session(&remote_id) else {
            return Ok(());
        };
        session
            .transition(SessionState::Connected)
            .map_err(|e| violation(remote_id, e))?;
        info!(remote = %remote_id, "Session connected");

        self.announce_view(remote_id);
        Ok(())
    }

    pub async fn on_ice_received(
        &mut self,
        remote_id: ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError> {
        let Some(session) = self.live_session(&remote_id) else {
            debug!("Discarding ICE candidate from {}: no session", remote_id);
            return Ok(());
        };

        if !session.remote_description_set() {
            session.buffer_candidate(candidate);
            return Ok(());
        }

        let connection = session.connection.clone();
        if let Err(e) = connection.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {}", remote_id, e);
        }
        Ok(())
    }

    pub async fn on_remote_left(&mut self, remote_id: ParticipantId) {
        if self.close_session(remote_id).await {
            info!(remote = %remote_id, "Participant left the room");
        } else {
            debug!("Leave for {} without a session", remote_id);
        }
    }

    /// Swaps the outbound video of every session to `track` and makes it the
    /// local video track. Returns the track it replaced.
    ///
    /// All or nothing: if any session rejects the track, the sessions that took
    /// it are switched back and the current local video stays in place.
    pub async fn replace_outbound_video(
        &mut self,
        track: LocalTrack,
    ) -> Result<Option<LocalTrack>, ClientError> {
        let mut swapped = Vec::new();
        let mut rejected = Vec::new();

        for (remote_id, connection) in self.live_connections() {
            match connection.replace_video_track(&track).await {
                Ok(()) => swapped.push((remote_id, connection)),
                Err(e) => {
                    warn!("Failed to replace video track for {}: {}", remote_id, e);
                    rejected.push(remote_id);
                }
            }
        }

        if rejected.is_empty() {
            return Ok(self.local_media.set_video(track));
        }

        if let Some(current) = self.local_media.video() {
            for (remote_id, connection) in swapped {
                if let Err(e) = connection.replace_video_track(current).await {
                    error!("Failed to restore video track for {}: {}", remote_id, e);
                }
            }
        }
        Err(ClientError::VideoSwapRejected { rejected })
    }

    pub async fn switch_camera(&mut self, device_id: String) -> Result<(), ClientError> {
        let media = match self
            .media_source
            .acquire(&MediaConstraints::Device(device_id))
            .await
        {
            Ok(media) => media,
            Err(e) => return Err(self.media_unavailable(e)),
        };

        for track in media.tracks().iter().filter(|t| t.kind() == TrackKind::Audio) {
            track.stop();
        }
        let Some(video) = media.video().cloned() else {
            let e = SignalingError::MediaUnavailable("device has no video track".into());
            return Err(self.media_unavailable(e));
        };

        if let Some(current) = self.local_media.video() {
            video.set_enabled(current.is_enabled());
        }
        match self.replace_outbound_video(video.clone()).await {
            Ok(old) => {
                if let Some(old) = old {
                    old.stop();
                }
                Ok(())
            }
            Err(e) => {
                video.stop();
                Err(e)
            }
        }
    }

    pub async fn list_cameras(&self) -> Result<Vec<MediaDevice>, ClientError> {
        Ok(self.media_source.video_inputs().await?)
    }

    pub fn toggle_audio(&mut self) -> bool {
        let enabled = self.local_media.toggle_audio();
        info!("Audio {}", if enabled { "unmuted" } else { "muted" });
        enabled
    }

    pub fn toggle_video(&mut self) -> bool {
        let enabled = self.local_media.toggle_video();
        info!("Camera {}", if enabled { "on" } else { "off" });
        enabled
    }

    pub fn send_chat(&mut self, text: String) -> Result<(), ClientError> {
        self.signaling.send(ClientMessage::Chat { text: text.clone() })?;
        self.emit(UiEvent::ChatMessage { from: None, text });
        Ok(())
    }

    /// Closes every session, stops local media and tells the relay.
    pub async fn leave_room(&mut self) {
        if self.left {
            return;
        }

        let sessions: Vec<PeerSession> = self.sessions.drain().collect();
        for mut session in sessions {
            session.close();
            self.shut_down(session).await;
        }

        self.local_media.stop();
        self.send_signal(ClientMessage::Leave);
        self.left = true;
        info!(participant = %self.local_id, "Left the room");
    }

    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .iter()
            .map(|s| SessionSnapshot {
                remote_id: s.remote_id,
                remote_nickname: s.remote_nickname.clone(),
                role: s.role,
                state: s.state(),
                pending_candidates: s.pending_candidates(),
            })
            .collect()
    }

    /// Closes sessions that have been negotiating for longer than the timeout.
    pub async fn sweep_stalled(&mut self, now: Instant) {
        for remote_id in self
            .sessions
            .stalled(self.config.negotiation_timeout, now)
        {
            warn!(
                remote = %remote_id,
                "Session did not connect within {:?}. Closing",
                self.config.negotiation_timeout
            );
            self.close_session(remote_id).await;
        }
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        let remote_id = event.remote_id;

        match event.kind {
            PeerEventKind::IceCandidate(candidate) => {
                if self.live_session(&remote_id).is_none() {
                    return;
                }
                self.send_signal(ClientMessage::IceCandidate {
                    target_id: remote_id,
                    candidate,
                });
            }

            PeerEventKind::RemoteStream(stream) => {
                let Some(session) = self.live_session(&remote_id) else {
                    return;
                };
                debug!(remote = %remote_id, stream = stream.stream_id.as_str(), "Remote stream arrived");
                session.add_remote_stream(stream);
                self.announce_view(remote_id);
            }

            PeerEventKind::ConnectionState(state) => {
                self.on_connection_state(remote_id, state).await;
            }
        }
    }

    async fn on_connection_state(&mut self, remote_id: ParticipantId, state: PeerConnectionState) {
        match state {
            PeerConnectionState::Connected => {
                let Some(session) = self.live_session(&remote_id) else {
                    return;
                };
                if session.state() == SessionState::AnswerSent {
                    if let Err(e) = session.transition(SessionState::Connected) {
                        warn!("{}", e);
                        return;
                    }
                    info!(remote = %remote_id, "Session connected");
                }
                self.announce_view(remote_id);
            }
            PeerConnectionState::Failed => {
                warn!(remote = %remote_id, "Peer connection failed");
                self.close_session(remote_id).await;
            }
            PeerConnectionState::Disconnected => {
                info!(remote = %remote_id, "Peer connection interrupted");
            }
            other => debug!(remote = %remote_id, "Peer connection state {:?}", other),
        }
    }

    async fn handle_command(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::ReplaceOutboundVideo { track, reply } => {
                let result = self.replace_outbound_video(track).await.map(|_| ());
                let _ = reply.send(result);
            }
            ClientCommand::SwitchCamera { device_id, reply } => {
                let _ = reply.send(self.switch_camera(device_id).await);
            }
            ClientCommand::ListCameras { reply } => {
                let _ = reply.send(self.list_cameras().await);
            }
            ClientCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.toggle_audio());
            }
            ClientCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.toggle_video());
            }
            ClientCommand::SendChat { text, reply } => {
                let _ = reply.send(self.send_chat(text));
            }
            ClientCommand::LeaveRoom { reply } => {
                self.leave_room().await;
                let _ = reply.send(());
            }
            ClientCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn open_connection(
        &self,
        remote_id: ParticipantId,
    ) -> Result<Arc<dyn PeerConnection>, SignalingError> {
        self.connector
            .connect(remote_id, &self.ice_servers, self.peer_tx.clone())
            .await
            .map_err(|e| failure(remote_id, e))
    }

    async fn attach_local_tracks(
        &self,
        remote_id: ParticipantId,
        connection: &Arc<dyn PeerConnection>,
    ) -> Result<(), SignalingError> {
        for track in self.local_media.tracks() {
            connection
                .add_track(track)
                .await
                .map_err(|e| failure(remote_id, e))?;
        }
        Ok(())
    }

    /// Sets the remote description, then applies buffered candidates in order.
    async fn apply_remote_description(
        &mut self,
        remote_id: ParticipantId,
        connection: &Arc<dyn PeerConnection>,
        desc: SessionDescription,
    ) -> Result<(), SignalingError> {
        connection
            .set_remote_description(desc)
            .await
            .map_err(|e| failure(remote_id, e))?;

        let Some(session) = self.live_session(&remote_id) else {
            return Ok(());
        };
        session.mark_remote_description_set();
        let pending = session.take_pending_candidates();

        if !pending.is_empty() {
            debug!(remote = %remote_id, count = pending.len(), "Applying buffered ICE candidates");
        }
        for candidate in pending {
            if let Err(e) = connection.add_ice_candidate(candidate).await {
                warn!("Failed to add buffered ICE candidate from {}: {}", remote_id, e);
            }
        }
        Ok(())
    }

    fn announce_view(&mut self, remote_id: ParticipantId) {
        let Some(session) = self.sessions.get_mut(&remote_id) else {
            return;
        };
        let Some(stream) = session.announce_view() else {
            return;
        };
        let nickname = session.remote_nickname.clone();
        self.emit(UiEvent::RemoteStreamAvailable {
            remote_id,
            nickname,
            stream,
        });
    }

    /// Removes and closes the session. Returns false if there was none.
    async fn close_session(&mut self, remote_id: ParticipantId) -> bool {
        let Some(mut session) = self.sessions.remove(&remote_id) else {
            return false;
        };
        session.close();
        self.shut_down(session).await;
        true
    }

    async fn shut_down(&self, session: PeerSession) {
        if let Err(e) = session.connection.close().await {
            warn!("Failed to close connection to {}: {}", session.remote_id, e);
        }
        self.emit(UiEvent::RemoveRemoteView {
            remote_id: session.remote_id,
        });
    }

    fn live_session(&mut self, remote_id: &ParticipantId) -> Option<&mut PeerSession> {
        self.sessions.get_mut(remote_id).filter(|s| !s.is_closed())
    }

    fn live_connections(&self) -> Vec<(ParticipantId, Arc<dyn PeerConnection>)> {
        self.sessions
            .iter()
            .filter(|s| !s.is_closed())
            .map(|s| (s.remote_id, s.connection.clone()))
            .collect()
    }

    fn media_unavailable(&self, e: SignalingError) -> ClientError {
        warn!("Local media unavailable: {}", e);
        self.emit(UiEvent::MediaUnavailable {
            reason: e.to_string(),
        });
        e.into()
    }

    fn send_signal(&self, message: ClientMessage) {
        if let Err(e) = self.signaling.send(message) {
            error!("Failed to send to relay: {}", e);
        }
    }

    fn emit(&self, event: UiEvent) {
        if self.ui_tx.send(event).is_err() {
            debug!("UI receiver dropped");
        }
    }
}

fn violation(remote_id: ParticipantId, reason: impl Display) -> SignalingError {
    SignalingError::ProtocolViolation {
        remote_id,
        reason: reason.to_string(),
    }
}

fn failure(remote_id: ParticipantId, reason: impl Display) -> SignalingError {
    SignalingError::NegotiationFailure {
        remote_id,
        reason: reason.to_string(),
    }
}
