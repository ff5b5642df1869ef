use huddle_core::IceServerConfig;
use huddle_core::utils::default_ice_servers;

/// Relay settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Handed to every client in the `connected` message.
    pub ice_servers: Vec<IceServerConfig>,
    /// Capacity of the router's command queue.
    pub command_buffer: usize,
}

impl RelayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            ice_servers: default_ice_servers(),
            command_buffer: 256,
        }
    }
}
