//! Language model abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Text generation backend used by the reasoning loop.
///
/// Implementations never fail: an empty string means "no signal" and callers
/// must treat it as such rather than as an answer.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single-prompt completion
    async fn generate(&self, prompt: &str, temperature: f32, stop: &[&str]) -> String;

    /// Multi-message chat completion
    async fn chat(&self, messages: &[ChatMessage], temperature: f32) -> String;

    /// Name of the model bound to this backend
    fn model_name(&self) -> &str;
}
