use crate::{RouterCommand, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ParticipantId, ServerMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let participant_id = ParticipantId::new();
    info!("New WebSocket connection: {}", participant_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(participant_id, tx);

    if let Err(e) = service
        .router_tx
        .send(RouterCommand::Connected { participant_id })
        .await
    {
        error!("Router died: {}", e);
        service.remove_peer(&participant_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            let cmd = RouterCommand::Message {
                                participant_id,
                                message,
                            };
                            if let Err(e) = service.router_tx.send(cmd).await {
                                error!("Router died: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Invalid ClientMessage from {}: {:?}", participant_id, e);
                            let reply = ServerMessage::Error {
                                message: format!("Invalid message format: {}", e),
                            };
                            let _ = service.send_signal(participant_id, &reply);
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&participant_id);

    let _ = service
        .router_tx
        .send(RouterCommand::Disconnected { participant_id })
        .await;

    info!("WebSocket disconnected: {}", participant_id);
}
