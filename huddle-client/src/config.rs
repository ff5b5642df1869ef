use std::time::Duration;

use huddle_core::IceServerConfig;

use crate::error::ClientError;
use crate::media::MediaConstraints;

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay.
    pub relay_url: String,
    /// Overrides the ICE servers announced by the relay.
    pub ice_servers: Option<Vec<IceServerConfig>>,
    /// Sessions that have not connected after this long are closed.
    pub negotiation_timeout: Duration,
    /// How often stalled sessions are looked for.
    pub sweep_interval: Duration,
    /// How long to wait for the relay's greeting.
    pub connect_timeout: Duration,
    /// Capture constraints used when joining.
    pub initial_constraints: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:3000/ws".to_owned(),
            ice_servers: None,
            negotiation_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            initial_constraints: MediaConstraints::default(),
        }
    }
}

impl ClientConfig {
    /// Rejects durations the client cannot run with.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.sweep_interval.is_zero() {
            return Err(ClientError::InvalidConfig(
                "sweep_interval must be greater than zero".into(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "connect_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
