//! Configuration for the context engine
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! `CONTEXT__<SECTION>__<KEY>` environment variables (a `.env` file is
//! loaded first when present).

use crate::context::keywords::DEFAULT_STOP_WORDS;
use crate::error::{ContextError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tagging: TaggingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from an optional TOML file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix("CONTEXT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file (missing file falls back to defaults)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    /// Parse a TOML document without touching the environment
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.context.buffer_capacity == 0 {
            return Err(ContextError::Configuration(
                "context.buffer_capacity must be at least 1".to_string(),
            ));
        }
        if self.budget.max_tokens == 0 {
            return Err(ContextError::Configuration(
                "budget.max_tokens must be at least 1".to_string(),
            ));
        }
        if self.registry.max_conversations == 0 {
            return Err(ContextError::Configuration(
                "registry.max_conversations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Relevance window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Messages retained per conversation window
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Tokens excluded from the keyword index
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,
}

fn default_buffer_capacity() -> usize {
    crate::context::buffer::DEFAULT_BUFFER_CAPACITY
}

fn default_stop_words() -> Vec<String> {
    DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            stop_words: default_stop_words(),
        }
    }
}

/// Conversation registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Upper bound on live conversation windows
    #[serde(default = "default_max_conversations")]
    pub max_conversations: u64,

    /// Drop a window after this many idle seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: Option<u64>,
}

fn default_max_conversations() -> u64 {
    10_000
}

fn default_idle_timeout() -> Option<u64> {
    Some(3600)
}

impl RegistryConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

/// Token budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum transcript size in encoder tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Encoding name (cl100k_base, p50k_base, r50k_base) or model name
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_max_tokens() -> usize {
    3000
}

fn default_encoding() -> String {
    "cl100k_base".to_string()
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            encoding: default_encoding(),
        }
    }
}

/// Chat completion endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_llm_retries")]
    pub max_retries: usize,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_llm_max_tokens() -> usize {
    400
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_llm_retries() -> usize {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_llm_retries(),
        }
    }
}

/// Tag generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    #[serde(default = "default_tagging_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_tagging_temperature")]
    pub temperature: f32,

    #[serde(default = "default_tagging_max_tokens")]
    pub max_tokens: usize,
}

fn default_tagging_prompt() -> String {
    "Provide relevant subject tags for the message as a JSON array.".to_string()
}

fn default_tagging_temperature() -> f32 {
    0.3
}

fn default_tagging_max_tokens() -> usize {
    50
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_tagging_prompt(),
            temperature: default_tagging_temperature(),
            max_tokens: default_tagging_max_tokens(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
