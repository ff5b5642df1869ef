use futures::{SinkExt, StreamExt};
use huddle_core::ServerMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::ClientError;
use crate::signaling::ChannelSink;

/// WebSocket connection to the relay.
pub struct WsSignaling;

impl WsSignaling {
    /// Opens the socket and spawns its reader and writer tasks.
    ///
    /// The returned receiver closes when the relay goes away; dropping every
    /// clone of the sink closes the socket.
    pub async fn connect(
        url: &str,
    ) -> Result<(ChannelSink, mpsc::UnboundedReceiver<ServerMessage>), ClientError> {
        let (socket, _) = connect_async(url).await?;
        info!("Connected to relay at {}", url);

        let (mut writer, mut reader) = socket.split();
        let (sink, mut outbound) = ChannelSink::pair();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(message) = outbound.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to encode {:?}: {}", message, e);
                        continue;
                    }
                };
                if let Err(e) = writer.send(Message::Text(json.into())).await {
                    error!("Relay write failed: {}", e);
                    return;
                }
            }
            let _ = writer.send(Message::Close(None)).await;
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(message) => {
                            if inbound_tx.send(message).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ServerMessage from relay: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("Relay read failed: {}", e);
                        break;
                    }
                }
            }
            info!("Relay connection closed");
        });

        Ok((sink, inbound_rx))
    }
}
