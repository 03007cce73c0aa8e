//! Token counting using tiktoken

use std::sync::Arc;
use thiserror::Error;
use tiktoken_rs::{cl100k_base, get_bpe_from_model, p50k_base, r50k_base, CoreBPE};

/// Encoder failures
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("Encoder initialization failed: {0}")]
    Initialization(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Token estimator trait for different tokenization strategies
///
/// Implementations must be deterministic for a given encoding.
pub trait TokenEstimator: Send + Sync {
    /// Count the tokens in the given text
    fn estimate(&self, text: &str) -> Result<usize, EstimatorError>;

    /// Count tokens for multiple texts
    fn estimate_batch(&self, texts: &[&str]) -> Result<Vec<usize>, EstimatorError> {
        texts.iter().map(|t| self.estimate(t)).collect()
    }

    /// Sum of token counts over all texts
    fn estimate_total(&self, texts: &[&str]) -> Result<usize, EstimatorError> {
        texts.iter().try_fold(0usize, |total, t| Ok(total + self.estimate(t)?))
    }
}

/// Tiktoken-based token estimator
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TiktokenEstimator {
    /// Create with cl100k_base encoding (GPT-4, GPT-3.5-turbo)
    pub fn new() -> Result<Self, EstimatorError> {
        Self::for_encoding("cl100k_base")
    }

    /// Create from an encoding name, or failing that a model name
    pub fn for_encoding(name: &str) -> Result<Self, EstimatorError> {
        let bpe = match name {
            "cl100k_base" => cl100k_base(),
            "p50k_base" => p50k_base(),
            "r50k_base" => r50k_base(),
            model => get_bpe_from_model(model),
        }
        .map_err(|e| EstimatorError::Initialization(format!("{name}: {e}")))?;

        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> Result<usize, EstimatorError> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }
}

/// Word-based token estimator (offline fallback, ~1.3 tokens per word)
pub struct WordBasedEstimator {
    tokens_per_word: f64,
}

impl WordBasedEstimator {
    pub fn new(tokens_per_word: f64) -> Self {
        Self { tokens_per_word }
    }
}

impl Default for WordBasedEstimator {
    fn default() -> Self {
        Self::new(1.3)
    }
}

impl TokenEstimator for WordBasedEstimator {
    fn estimate(&self, text: &str) -> Result<usize, EstimatorError> {
        let word_count = text.split_whitespace().count();
        Ok((word_count as f64 * self.tokens_per_word).ceil() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiktoken_estimator() {
        let estimator = TiktokenEstimator::new().unwrap();
        let text = "Hello, world! This is a test.";
        let tokens = estimator.estimate(text).unwrap();
        assert!(tokens > 0);
        assert!(tokens < 20); // Should be around 8-10 tokens
    }

    #[test]
    fn test_tiktoken_is_deterministic() {
        let estimator = TiktokenEstimator::new().unwrap();
        let text = "The quick brown fox jumps over the lazy dog.";
        assert_eq!(estimator.estimate(text).unwrap(), estimator.estimate(text).unwrap());
    }

    #[test]
    fn test_unknown_encoding_fails() {
        let result = TiktokenEstimator::for_encoding("not-a-real-model");
        assert!(matches!(result, Err(EstimatorError::Initialization(_))));
    }

    #[test]
    fn test_word_based_estimator() {
        let estimator = WordBasedEstimator::default();
        let tokens = estimator.estimate("Hello world test").unwrap();
        assert_eq!(tokens, 4); // 3 words * 1.3 = 3.9 -> 4
    }

    #[test]
    fn test_batch_and_total() {
        let estimator = WordBasedEstimator::new(1.0);
        let texts = vec!["one", "two words", "three little words"];
        assert_eq!(estimator.estimate_batch(&texts).unwrap(), vec![1, 2, 3]);
        assert_eq!(estimator.estimate_total(&texts).unwrap(), 6);
    }
}
