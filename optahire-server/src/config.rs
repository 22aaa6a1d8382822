use crate::auth::TokenGrant;
use crate::error::ConfigError;
use optahire_core::IceServerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Runtime settings of the signaling server. Every field has a default, so an
/// empty JSON object is a valid config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// WebSocket path clients connect to.
    pub path: String,
    /// Handed to clients in `callRoomJoined`.
    pub ice_servers: Vec<IceServerConfig>,
    pub negotiation_timeout_secs: u64,
    pub end_call_requires_interviewer: bool,
    pub relay_queue_capacity: usize,
    pub tokens: Vec<TokenGrant>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            path: "/video-interviews".to_owned(),
            ice_servers: IceServerConfig::default_stun(),
            negotiation_timeout_secs: 45,
            end_call_requires_interviewer: true,
            relay_queue_capacity: 256,
            tokens: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "path must start with '/', got {:?}",
                self.path
            )));
        }
        if self.path == "/healthz" {
            return Err(ConfigError::Invalid("path collides with /healthz".to_owned()));
        }
        if self.negotiation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "negotiation_timeout_secs must be positive".to_owned(),
            ));
        }
        if self.relay_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "relay_queue_capacity must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_secs(self.negotiation_timeout_secs)
    }
}
