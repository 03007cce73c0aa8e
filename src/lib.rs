//! Bounded conversational context for LLM agents
//!
//! Decides which prior messages stay visible to the model as a dialogue
//! grows past its token budget:
//! - A fixed-capacity window of recent messages per conversation
//! - A keyword frequency index rebuilt from that window
//! - Bag-of-words relevance scoring against the index
//! - Relevance-ordered pruning that never evicts system messages or the
//!   most recent turn

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod service;
pub mod tagging;

pub use config::Config;
pub use context::{ContextManager, Message, PruneReport, Role, TokenBudgetEnforcer, Transcript};
pub use error::{ContextError, Result};
pub use service::ContextService;

use config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let result = if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
