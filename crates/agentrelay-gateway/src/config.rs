use agentrelay_core::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Queue bounds and staleness limits for event delivery.
///
/// Every field has a default, so an empty `[delivery]` table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum buffered events per thread; the oldest is dropped beyond it.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// Idle time after which a session is reclaimed.
    #[serde(default = "default_session_max_age_ms")]
    pub session_max_age_ms: u64,
    /// Idle time after which a client connection is closed and dropped.
    #[serde(default = "default_connection_max_age_ms")]
    pub connection_max_age_ms: u64,
    /// Period of the staleness sweep.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

fn default_max_queue_size() -> usize {
    100
}
fn default_session_max_age_ms() -> u64 {
    3_600_000
}
fn default_connection_max_age_ms() -> u64 {
    300_000
}
fn default_sweep_interval_ms() -> u64 {
    60_000
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_max_queue_size(),
            session_max_age_ms: default_session_max_age_ms(),
            connection_max_age_ms: default_connection_max_age_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl DeliveryConfig {
    /// [`DeliveryConfig::session_max_age_ms`] as a `Duration`.
    pub fn session_max_age(&self) -> Duration {
        Duration::from_millis(self.session_max_age_ms)
    }

    /// [`DeliveryConfig::connection_max_age_ms`] as a `Duration`.
    pub fn connection_max_age(&self) -> Duration {
        Duration::from_millis(self.connection_max_age_ms)
    }

    /// [`DeliveryConfig::sweep_interval_ms`] as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Reject values the delivery components cannot operate with.
    pub fn validate(&self) -> RelayResult<()> {
        if self.max_queue_size == 0 {
            return Err(RelayError::Config(
                "delivery.max_queue_size must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(RelayError::Config(
                "delivery.sweep_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
