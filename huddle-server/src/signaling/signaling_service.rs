use crate::router::RouterCommand;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{ParticipantId, ServerMessage, SignalingError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

struct SignalingInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
}

/// Table of open WebSocket connections plus the handle to the router task.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) router_tx: mpsc::Sender<RouterCommand>,
}

impl SignalingService {
    pub fn new(router_tx: mpsc::Sender<RouterCommand>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
            router_tx,
        }
    }

    pub fn add_peer(&self, participant_id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(participant_id, tx);
    }

    pub fn remove_peer(&self, participant_id: &ParticipantId) {
        self.inner.peers.remove(participant_id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn router(&self) -> mpsc::Sender<RouterCommand> {
        self.router_tx.clone()
    }

    pub fn send_signal(
        &self,
        participant_id: ParticipantId,
        msg: &ServerMessage,
    ) -> Result<(), SignalingError> {
        let Some(peer) = self.inner.peers.get(&participant_id) else {
            return Err(SignalingError::RoutingMiss(participant_id));
        };

        let json = serde_json::to_string(msg)?;
        if let Err(e) = peer.send(Message::Text(json.into())) {
            error!("Failed to send WS message to {}: {:?}", participant_id, e);
            return Err(SignalingError::RoutingMiss(participant_id));
        }
        Ok(())
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(
        &self,
        participant_id: ParticipantId,
        message: ServerMessage,
    ) -> Result<(), SignalingError> {
        self.send_signal(participant_id, &message)
    }
}
