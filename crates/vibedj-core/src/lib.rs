//! Vibe DJ Core - image in, musical vibe out.
//!
//! A thin HTTP front-end that forwards an uploaded image to a vision LLM and
//! returns the model's description as plain text.
//!
//! # Architecture
//!
//! ```text
//! POST /findTheVibe → size-capped body read → LlmClient::describe_image → "The vibe is: …"
//! ```
//!
//! The backend is chosen once at startup from the deployment mode: a local
//! Ollama host in development, the Replicate predictions API in production.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vibedj_core::{AppState, Config, LlmClientFactory, Server};
//!
//! #[tokio::main]
//! async fn main() -> vibedj_core::Result<()> {
//!     let config = Config::load()?;
//!     let client = LlmClientFactory::create(&config.llm, config.llm_timeout())?;
//!     let server = Server::bind(&config.server, AppState::new(client, &config)).await?;
//!     server.run().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod server;

pub use config::{Config, DeploymentMode};
pub use error::{ConfigError, LlmError, LlmResult, Result, VibeError};
pub use llm::{LlmClient, LlmClientFactory};
pub use server::{build_router, AppState, Server};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
