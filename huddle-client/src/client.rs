use std::sync::Arc;

use huddle_core::{ClientMessage, IceServerConfig, ParticipantId, ServerMessage};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::media::{LocalTrack, MediaDevice, MediaSource};
use crate::orchestrator::{
    ClientCommand, LocalParticipant, Orchestrator, SessionSnapshot, UiEvent,
};
use crate::peer::PeerConnector;
use crate::signaling::{SignalingSink, WsSignaling};

const COMMAND_BUFFER: usize = 64;

/// Entry point for joining calls.
pub struct Client {
    config: ClientConfig,
    connector: Arc<dyn PeerConnector>,
    media_source: Arc<dyn MediaSource>,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn PeerConnector>,
        media_source: Arc<dyn MediaSource>,
    ) -> Self {
        Self {
            config,
            connector,
            media_source,
        }
    }

    /// Connects to the relay over WebSocket and joins `room`.
    pub async fn join(
        &self,
        room: &str,
        nickname: &str,
    ) -> Result<(ClientHandle, mpsc::UnboundedReceiver<UiEvent>), ClientError> {
        self.config.validate()?;
        let (sink, signal_rx) = WsSignaling::connect(&self.config.relay_url).await?;
        self.join_over(room, nickname, Arc::new(sink), signal_rx)
            .await
    }

    /// Joins `room` over an already open relay connection.
    ///
    /// Waits for the relay's greeting, then acquires local media. If capture
    /// fails the room is not joined and the error is returned. Audio starts muted.
    pub async fn join_over(
        &self,
        room: &str,
        nickname: &str,
        signaling: Arc<dyn SignalingSink>,
        mut signal_rx: mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Result<(ClientHandle, mpsc::UnboundedReceiver<UiEvent>), ClientError> {
        self.config.validate()?;

        let (participant_id, relay_ice_servers) =
            tokio::time::timeout(self.config.connect_timeout, wait_for_greeting(&mut signal_rx))
                .await
                .map_err(|_| ClientError::HandshakeTimeout(self.config.connect_timeout))??;

        let ice_servers = self
            .config
            .ice_servers
            .clone()
            .unwrap_or(relay_ice_servers);

        let media = self
            .media_source
            .acquire(&self.config.initial_constraints)
            .await?;
        media.set_audio_enabled(false);

        signaling.send(ClientMessage::Join {
            room: room.to_owned(),
            nickname: nickname.to_owned(),
        })?;
        info!(participant = %participant_id, room, nickname, "Joining room");

        let (orchestrator, ui_rx) = Orchestrator::new(
            self.config.clone(),
            LocalParticipant {
                id: participant_id,
                nickname: nickname.to_owned(),
                ice_servers,
                media,
            },
            self.connector.clone(),
            self.media_source.clone(),
            signaling,
        );

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(orchestrator.run(signal_rx, command_rx));

        let handle = ClientHandle {
            participant_id,
            command_tx,
            task,
        };
        Ok((handle, ui_rx))
    }
}

async fn wait_for_greeting(
    signal_rx: &mut mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<(ParticipantId, Vec<IceServerConfig>), ClientError> {
    while let Some(message) = signal_rx.recv().await {
        match message {
            ServerMessage::Connected {
                participant_id,
                ice_servers,
            } => return Ok((participant_id, ice_servers)),
            other => debug!("Ignoring {:?} before greeting", other),
        }
    }
    Err(ClientError::Stopped)
}

/// Control surface of a running call.
pub struct ClientHandle {
    participant_id: ParticipantId,
    command_tx: mpsc::Sender<ClientCommand>,
    task: JoinHandle<()>,
}

impl ClientHandle {
    pub fn participant_id(&self) -> ParticipantId {
        self.participant_id
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), ClientError> {
        let text = text.into();
        self.request(|reply| ClientCommand::SendChat { text, reply })
            .await?
    }

    /// Returns whether audio is on afterwards.
    pub async fn toggle_audio(&self) -> Result<bool, ClientError> {
        self.request(|reply| ClientCommand::ToggleAudio { reply })
            .await
    }

    /// Returns whether the camera is on afterwards.
    pub async fn toggle_video(&self) -> Result<bool, ClientError> {
        self.request(|reply| ClientCommand::ToggleVideo { reply })
            .await
    }

    pub async fn switch_camera(&self, device_id: impl Into<String>) -> Result<(), ClientError> {
        let device_id = device_id.into();
        self.request(|reply| ClientCommand::SwitchCamera { device_id, reply })
            .await?
    }

    pub async fn list_cameras(&self) -> Result<Vec<MediaDevice>, ClientError> {
        self.request(|reply| ClientCommand::ListCameras { reply })
            .await?
    }

    pub async fn replace_outbound_video(&self, track: LocalTrack) -> Result<(), ClientError> {
        self.request(|reply| ClientCommand::ReplaceOutboundVideo { track, reply })
            .await?
    }

    pub async fn sessions(&self) -> Result<Vec<SessionSnapshot>, ClientError> {
        self.request(|reply| ClientCommand::Snapshot { reply })
            .await
    }

    /// Leaves the room and waits for the orchestrator to finish.
    ///
    /// If the orchestrator already left on its own (relay gone), this only
    /// waits for it.
    pub async fn leave(self) -> Result<(), ClientError> {
        match self
            .request(|reply| ClientCommand::LeaveRoom { reply })
            .await
        {
            Ok(()) => {}
            Err(ClientError::Stopped) => debug!("Orchestrator already left the room"),
            Err(e) => return Err(e),
        }
        self.task
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ClientCommand,
    ) -> Result<T, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| ClientError::Stopped)?;
        rx.await.map_err(|_| ClientError::Stopped)
    }
}
