//! Error types for context relevance and budget enforcement

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors surfaced by the context engine
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token encoder failed: {0}")]
    Encoder(#[from] crate::context::EstimatorError),

    #[error("Language model call failed: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for ContextError {
    fn from(err: config::ConfigError) -> Self {
        ContextError::Configuration(err.to_string())
    }
}
