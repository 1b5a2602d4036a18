//! Configuration management for Vibe DJ.
//!
//! Configuration is read once at startup: a TOML file (optional) supplies the
//! base values, then a handful of environment variables override them. The
//! resulting `Config` is immutable and passed explicitly to whatever needs it.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable selecting the deployment mode.
pub const ENV_MODE: &str = "ENV";
/// Environment variable overriding the Ollama endpoint.
pub const ENV_LLM_URL: &str = "LLM_URL";
/// Environment variable carrying the Replicate API token.
pub const ENV_REPLICATE_TOKEN: &str = "REPLICATE_API_TOKEN";
/// Environment variable overriding the listen port.
pub const ENV_PORT: &str = "PORT";

/// Root configuration structure for Vibe DJ.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Backend settings
    pub llm: LlmConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories (e.g. `~/.config/vibedj/config.toml`
    /// on Linux), falling back to `~/.vibedj/config.toml`.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "vibedj", "vibedj")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".vibedj").join("config.toml")
            })
    }

    /// Expand `~` in a user-supplied path.
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).into_owned())
    }

    /// Apply environment overrides using the given lookup, then re-validate.
    ///
    /// The lookup is injectable so tests never touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_MODE) {
            self.llm.mode = DeploymentMode::parse(&mode);
        }
        if let Some(url) = lookup(ENV_LLM_URL).filter(|v| !v.is_empty()) {
            self.llm.ollama.endpoint = url;
        }
        if let Some(token) = lookup(ENV_REPLICATE_TOKEN).filter(|v| !v.is_empty()) {
            self.llm.replicate.api_token = token;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("{ENV_PORT} must be a port number, got '{port}'"))
            })?;
        }
        self.validate()
    }

    /// Request body cap in bytes.
    pub fn max_body_bytes(&self) -> usize {
        (self.limits.max_body_mb as usize).saturating_mul(1024 * 1024)
    }

    /// Deadline for a single backend call.
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.llm_timeout_ms)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
