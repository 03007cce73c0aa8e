//! Language model seam
//!
//! The engine treats the model as a black box mapping an ordered message
//! list to a reply string.

pub mod openai;

pub use openai::OpenAiChatClient;

use crate::context::Message;
use async_trait::async_trait;

/// Per-call sampling options
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 400,
        }
    }
}

/// Chat completion client
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the conversation and return the assistant's reply
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}

/// Language model errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unknown error")]
    Unknown,
}
