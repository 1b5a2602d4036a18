//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Prompt sent with every image unless the caller supplies one.
pub const DEFAULT_PROMPT: &str = "what is the musical vibe of this image?";

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port. Config and `PORT` must be nonzero; `Server::bind` itself
    /// accepts 0 and picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Resource limits protecting the server and its backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in mebibytes
    pub max_body_mb: u64,

    /// Upper bound on one backend call in milliseconds
    pub llm_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_mb: 100,
            llm_timeout_ms: 120_000,
        }
    }
}

/// Which backend family serves requests.
///
/// Only the exact value `production` selects the hosted backend; every other
/// value, including typos, falls back to local inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeploymentMode {
    /// Hosted prediction API (Replicate)
    Production,
    /// Local inference host (Ollama)
    #[default]
    Development,
}

impl DeploymentMode {
    pub fn parse(value: &str) -> Self {
        if value == "production" {
            DeploymentMode::Production
        } else {
            DeploymentMode::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Production => "production",
            DeploymentMode::Development => "development",
        }
    }
}

impl From<String> for DeploymentMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<DeploymentMode> for String {
    fn from(mode: DeploymentMode) -> Self {
        mode.as_str().to_string()
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Backend selection and per-backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Deployment mode selecting the backend
    pub mode: DeploymentMode,

    /// Default prompt for image descriptions
    pub prompt: String,

    /// Ollama (local) configuration
    pub ollama: OllamaConfig,

    /// Replicate (hosted) configuration
    pub replicate: ReplicateConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::default(),
            prompt: DEFAULT_PROMPT.to_string(),
            ollama: OllamaConfig::default(),
            replicate: ReplicateConfig::default(),
        }
    }
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Vision-capable model tag
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
        }
    }
}

/// Replicate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicateConfig {
    /// API base URL
    pub endpoint: String,

    /// API token (supports ${ENV_VAR} syntax)
    pub api_token: String,

    /// Model version hash passed to the predictions endpoint
    pub version: String,

    /// Delay between status polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.replicate.com/v1".to_string(),
            api_token: "${REPLICATE_API_TOKEN}".to_string(),
            version: "80537f9eead1a5bfa72d5ac6ea6414379be41d4d4f6679fd776e9535d1eb58bb"
                .to_string(),
            poll_interval_ms: 1000,
        }
    }
}
