//! Queue defaults, loadable from TOML.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIME_TO_LIVE_SECONDS: i64 = 3600;
pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: i64 = 30;
pub const DEFAULT_MAX_MESSAGES_PER_GET: usize = 32;

/// Settings shared by every queue a provider creates.
///
/// ```toml
/// default_time_to_live_seconds = 600
/// default_visibility_timeout_seconds = 15
/// max_messages_per_get = 16
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Time to live used by `MemoryNamedQueue::put`.
    pub default_time_to_live_seconds: i64,
    /// Lease length used by `MemoryNamedQueue::get`.
    pub default_visibility_timeout_seconds: i64,
    /// Upper bound on the batch returned by one get or peek.
    pub max_messages_per_get: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_time_to_live_seconds: DEFAULT_TIME_TO_LIVE_SECONDS,
            default_visibility_timeout_seconds: DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
            max_messages_per_get: DEFAULT_MAX_MESSAGES_PER_GET,
        }
    }
}

impl QueueConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_time_to_live_seconds < 0 {
            return Err(ConfigError::Invalid(format!(
                "default_time_to_live_seconds must be non-negative (got {})",
                self.default_time_to_live_seconds
            )));
        }
        if self.default_visibility_timeout_seconds < 0 {
            return Err(ConfigError::Invalid(format!(
                "default_visibility_timeout_seconds must be non-negative (got {})",
                self.default_visibility_timeout_seconds
            )));
        }
        if self.max_messages_per_get == 0 {
            return Err(ConfigError::Invalid(
                "max_messages_per_get must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
