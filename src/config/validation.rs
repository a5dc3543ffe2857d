//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and returns every
//! problem found, not just the first.

use thiserror::Error;

use crate::config::schema::ManagerConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backoff.step_ms must be greater than 0")]
    ZeroStep,

    #[error("backoff.initial_wait_ms ({initial}) exceeds backoff.max_wait_ms ({max})")]
    InitialExceedsMax { initial: u64, max: u64 },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backoff.step_ms == 0 {
        errors.push(ValidationError::ZeroStep);
    }

    if config.backoff.initial_wait_ms > config.backoff.max_wait_ms {
        errors.push(ValidationError::InitialExceedsMax {
            initial: config.backoff.initial_wait_ms,
            max: config.backoff.max_wait_ms,
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
