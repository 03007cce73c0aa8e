//! Context relevance and token budget enforcement
//!
//! Each conversation keeps a small window of recent message texts and a
//! keyword index derived from it. When a transcript outgrows its token
//! budget, the least relevant non-pinned messages are evicted first.

pub mod buffer;
pub mod keywords;
pub mod scorer;
pub mod window;
pub mod manager;
pub mod token_budget;
pub mod models;
pub mod token_estimator;

pub use buffer::{CircularBuffer, DEFAULT_BUFFER_CAPACITY};
pub use keywords::{tokenize, KeywordIndex, StopWords, DEFAULT_STOP_WORDS};
pub use scorer::{relevance_score, RelevanceSource};
pub use window::ContextWindow;
pub use manager::ContextManager;
pub use token_budget::TokenBudgetEnforcer;
pub use models::{Message, PruneReport, Role, Transcript};
pub use token_estimator::{EstimatorError, TokenEstimator, TiktokenEstimator, WordBasedEstimator};
