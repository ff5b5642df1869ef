use huddle_core::ClientMessage;
use tokio::sync::mpsc;

use crate::error::ClientError;

/// Outbound half of the relay connection.
pub trait SignalingSink: Send + Sync {
    fn send(&self, message: ClientMessage) -> Result<(), ClientError>;
}

/// Sink that queues messages on a channel drained by a transport task.
#[derive(Debug, Clone)]
pub struct ChannelSink(mpsc::UnboundedSender<ClientMessage>);

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self(tx)
    }

    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl SignalingSink for ChannelSink {
    fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.0.send(message).map_err(|_| ClientError::Stopped)
    }
}
