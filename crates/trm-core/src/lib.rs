//! trm-core: Shared library for talking to a local model endpoint
//!
//! Provides:
//! - Ollama API client with linear-backoff retries
//! - The `LanguageModel` seam the reasoning loop is written against

pub mod model;
pub mod ollama;
pub mod retry;

pub use model::{ChatMessage, LanguageModel, Role};
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
pub use retry::RetryConfig;
