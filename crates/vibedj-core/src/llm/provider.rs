//! LLM client trait and the factory that picks one at startup.
//!
//! Defines the single capability every backend implements (describe an
//! image), plus the factory that turns the deployment mode into a concrete
//! client.

use crate::config::{DeploymentMode, LlmConfig};
use crate::error::{ConfigError, LlmResult};
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;

/// Base64-encoded image ready to send to an LLM API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type sniffed from the leading bytes
    pub media_type: &'static str,
}

impl ImageInput {
    /// Encode raw bytes. The bytes are passed through untouched; an
    /// unrecognized format only affects the reported media type.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: sniff_media_type(bytes),
        }
    }

    /// Return a data URL suitable for APIs that take file URLs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

fn sniff_media_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Trait that all model backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the server holds an `Arc<dyn LlmClient>`).
///
/// Dropping the returned future aborts any outbound request in flight, which
/// is how an inbound disconnect cancels the backend call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Backend name for logging (e.g., "ollama", "replicate").
    fn name(&self) -> &str;

    /// Describe `image` according to `prompt`.
    async fn describe_image(&self, image: &[u8], prompt: &str) -> LlmResult<String>;

    /// Upper bound on a single `describe_image` call.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the backend for the configured deployment mode.
pub struct LlmClientFactory;

impl LlmClientFactory {
    /// Create the single client used for the lifetime of the process.
    ///
    /// Production mode requires a Replicate API token; a missing token is a
    /// fatal configuration error rather than a per-request failure.
    pub fn create(config: &LlmConfig, timeout: Duration) -> Result<Arc<dyn LlmClient>, ConfigError> {
        match config.mode {
            DeploymentMode::Production => {
                let cfg = &config.replicate;
                let api_token = resolve_env_var(&cfg.api_token).ok_or_else(|| {
                    ConfigError::MissingCredential(
                        "Replicate API token not set. Set REPLICATE_API_TOKEN env var.".to_string(),
                    )
                })?;
                tracing::info!(
                    mode = %config.mode,
                    endpoint = %cfg.endpoint,
                    "Using Replicate client"
                );
                Ok(Arc::new(super::replicate::ReplicateClient::new(
                    &cfg.endpoint,
                    &api_token,
                    &cfg.version,
                    Duration::from_millis(cfg.poll_interval_ms),
                    timeout,
                )))
            }
            DeploymentMode::Development => {
                let cfg = &config.ollama;
                tracing::info!(
                    mode = %config.mode,
                    endpoint = %cfg.endpoint,
                    model = %cfg.model,
                    "Using Ollama client"
                );
                Ok(Arc::new(super::ollama::OllamaClient::new(
                    &cfg.endpoint,
                    &cfg.model,
                    timeout,
                )))
            }
        }
    }
}
