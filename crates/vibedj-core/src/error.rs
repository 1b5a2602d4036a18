//! Error types for the Vibe DJ service.
//!
//! Errors are organized by origin: startup configuration versus calls to a
//! model backend. Backend errors keep enough structure (provider, status code,
//! kind) to be logged with context without the HTTP layer inspecting them.

use thiserror::Error;

/// Top-level error type for Vibe DJ operations.
#[derive(Error, Debug)]
pub enum VibeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend call errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// General I/O errors (listener bind, serve loop)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A backend credential is required but was not provided
    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

/// Errors from a single `describe_image` call against a backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The outbound request could not be built or serialized
    #[error("failed to create {provider} request: {message}")]
    Request { provider: String, message: String },

    /// Network or transport failure
    #[error("failed to send request to {provider}: {message}")]
    Transport { provider: String, message: String },

    /// The backend answered with a non-success status
    #[error("{provider} returned a non-200 status code: {status_code}")]
    Status {
        provider: String,
        status_code: u16,
        body: String,
    },

    /// The response body could not be parsed
    #[error("failed to decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// A hosted prediction finished in a failed or canceled state
    #[error("{provider} prediction {status}: {message}")]
    Prediction {
        provider: String,
        status: String,
        message: String,
    },

    /// The call did not complete within the configured deadline
    #[error("{provider} call timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },
}

impl LlmError {
    /// Short label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Request { .. } => "request",
            LlmError::Transport { .. } => "transport",
            LlmError::Status { .. } => "status",
            LlmError::Decode { .. } => "decode",
            LlmError::Prediction { .. } => "prediction",
            LlmError::Timeout { .. } => "timeout",
        }
    }

    /// Upstream HTTP status code, if the backend reported one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Convenience type alias for Vibe DJ results.
pub type Result<T> = std::result::Result<T, VibeError>;

/// Convenience type alias for backend call results.
pub type LlmResult<T> = std::result::Result<T, LlmError>;
