//! Configuration schema definitions.
//!
//! All types derive Serde traits so a manager can be configured from a TOML
//! file or built in code from the defaults.

use serde::{Deserialize, Serialize};

/// Root configuration for a channel manager.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    /// Creation retry backoff.
    pub backoff: BackoffConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl ManagerConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, crate::config::ConfigError> {
        let config: ManagerConfig = toml::from_str(content)?;
        crate::config::validation::validate_config(&config)
            .map_err(crate::config::ConfigError::Validation)?;
        Ok(config)
    }
}

/// Backoff applied between channel creation attempts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackoffConfig {
    /// Wait before the first retry in milliseconds.
    pub initial_wait_ms: u64,

    /// Upper bound for the wait in milliseconds.
    pub max_wait_ms: u64,

    /// Amount added to the wait after every failed attempt.
    pub step_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_wait_ms: 0,
            max_wait_ms: 10_000,
            step_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
