//! Model backends for image description.
//!
//! One capability trait (`LlmClient`) with a local implementation (Ollama)
//! and a hosted one (Replicate). Exactly one is chosen at startup.

pub(crate) mod ollama;
pub(crate) mod provider;
pub(crate) mod replicate;

pub use ollama::OllamaClient;
pub use provider::{resolve_env_var, ImageInput, LlmClient, LlmClientFactory};
pub use replicate::ReplicateClient;
