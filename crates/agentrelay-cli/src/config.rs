//! `agentrelay.toml` loading.

use agentrelay_core::{RelayError, RelayResult};
use agentrelay_gateway::DeliveryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level process configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// `[server]` table.
    #[serde(default)]
    pub server: ServerConfig,
    /// `[delivery]` table.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Listen address for the HTTP gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

impl RelayConfig {
    /// Read and validate `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> RelayResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(RelayError::Config(format!(
                    "Failed to read config '{}': {}",
                    path.display(),
                    e
                )))
            }
        };
        let config = Self::parse(&content).map_err(|e| {
            RelayError::Config(format!("Failed to parse config '{}': {}", path.display(), e))
        })?;
        config.delivery.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without validating it.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> RelayResult<String> {
        toml::to_string_pretty(self).map_err(|e| RelayError::Config(e.to_string()))
    }

    /// Apply `--host`/`--port` overrides.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
