//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be > 0".into(),
            ));
        }
        if self.limits.max_body_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_body_mb must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.llm.prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.prompt must not be empty".into(),
            ));
        }
        if self.llm.ollama.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.ollama.endpoint must not be empty".into(),
            ));
        }
        if self.llm.replicate.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.replicate.endpoint must not be empty".into(),
            ));
        }
        if self.llm.replicate.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "llm.replicate.poll_interval_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
