//! Shared, read-only request state.

use crate::config::Config;
use crate::llm::LlmClient;
use std::sync::Arc;

/// State cloned into every request. Built once before the listener starts
/// and never written afterwards, so no locking is involved.
#[derive(Clone)]
pub struct AppState {
    /// The backend chosen at startup
    pub client: Arc<dyn LlmClient>,
    /// Request body cap in bytes
    pub max_body_bytes: usize,
    /// Prompt used when the caller does not supply one
    pub default_prompt: Arc<str>,
}

impl AppState {
    pub fn new(client: Arc<dyn LlmClient>, config: &Config) -> Self {
        Self {
            client,
            max_body_bytes: config.max_body_bytes(),
            default_prompt: Arc::from(config.llm.prompt.as_str()),
        }
    }
}
