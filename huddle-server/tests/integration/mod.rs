
use std::sync::Arc;

use huddle_core::utils::default_ice_servers;
use huddle_core::{ClientMessage, ParticipantId};
use huddle_server::{MessageRouter, RelayStats, RouterCommand};
use tokio::sync::{mpsc, oneshot};
use tracing::Level;

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A router task wired to a recording mock transport.
pub struct TestRelay {
    cmd_tx: mpsc::Sender<RouterCommand>,
    pub signaling: MockSignalingOutput,
}

impl TestRelay {
    pub fn start() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RouterCommand>(100);
        let signaling = MockSignalingOutput::new();

        let router = MessageRouter::new(
            cmd_rx,
            Arc::new(signaling.clone()),
            default_ice_servers(),
        );
        tokio::spawn(router.run());

        Self { cmd_tx, signaling }
    }

    pub async fn connect(&self) -> ParticipantId {
        let participant_id = ParticipantId::new();
        self.signaling.connect(participant_id).await;
        self.command(RouterCommand::Connected { participant_id }).await;
        participant_id
    }

    pub async fn join(&self, participant_id: ParticipantId, room: &str, nickname: &str) {
        self.send(
            participant_id,
            ClientMessage::Join {
                room: room.into(),
                nickname: nickname.into(),
            },
        )
        .await;
    }

    pub async fn send(&self, participant_id: ParticipantId, message: ClientMessage) {
        self.command(RouterCommand::Message {
            participant_id,
            message,
        })
        .await;
    }

    pub async fn disconnect(&self, participant_id: ParticipantId) {
        self.signaling.disconnect(&participant_id).await;
        self.command(RouterCommand::Disconnected { participant_id })
            .await;
    }

    /// Waits until the router has processed everything sent so far.
    pub async fn flush(&self) -> RelayStats {
        let (reply, rx) = oneshot::channel();
        self.command(RouterCommand::Stats { reply }).await;
        rx.await.expect("router stopped")
    }

    async fn command(&self, cmd: RouterCommand) {
        self.cmd_tx.send(cmd).await.expect("router stopped");
    }
}
