//! Configuration for a combat tracker.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Configuration for a combat tracker.
///
/// Missing keys fall back to the defaults when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// How often a room session re-fetches shared state, in milliseconds.
    pub poll_interval_ms: u64,
    /// Initiative given to a combatant whose initiative is missing or invalid.
    pub default_initiative: i32,
    /// Max health given to a combatant whose max health is missing or invalid.
    pub default_max_health: u32,
    /// Max stamina given to a combatant whose max stamina is missing or invalid.
    pub default_max_stamina: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            default_initiative: 10,
            default_max_health: 50,
            default_max_stamina: 20,
        }
    }
}

impl TrackerConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> TrackerResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TrackerError::InvalidConfig(e.to_string()))?;
        if config.poll_interval_ms == 0 {
            return Err(TrackerError::InvalidConfig(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(config)
    }

    /// The room polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Set the room polling interval (at least one millisecond).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        self
    }

    /// Set the fallback initiative.
    pub fn with_default_initiative(mut self, initiative: i32) -> Self {
        self.default_initiative = initiative;
        self
    }

    /// Set the fallback max health (at least 1).
    pub fn with_default_max_health(mut self, max_health: u32) -> Self {
        self.default_max_health = max_health.max(1);
        self
    }

    /// Set the fallback max stamina.
    pub fn with_default_max_stamina(mut self, max_stamina: u32) -> Self {
        self.default_max_stamina = max_stamina;
        self
    }
}
