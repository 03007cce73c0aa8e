//! Per-conversation relevance window: buffer plus derived keyword index

use super::buffer::CircularBuffer;
use super::keywords::{KeywordIndex, StopWords};
use super::scorer::{relevance_score, RelevanceSource};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Recent message texts and the keyword index computed from them
///
/// The index is rebuilt on every ingestion so it never reflects evicted
/// messages.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    buffer: CircularBuffer,
    index: KeywordIndex,
    stop_words: Arc<StopWords>,
}

impl ContextWindow {
    pub fn new(capacity: NonZeroUsize, stop_words: Arc<StopWords>) -> Self {
        Self {
            buffer: CircularBuffer::with_capacity(capacity),
            index: KeywordIndex::default(),
            stop_words,
        }
    }

    /// Add a message to the window and rebuild the index
    pub fn ingest(&mut self, text: &str) {
        let evicted = self.buffer.add(text);
        self.index = KeywordIndex::build(self.buffer.iter(), &self.stop_words);

        debug!(
            buffered = self.buffer.len(),
            keywords = self.index.len(),
            evicted = evicted.is_some(),
            "Context window updated"
        );
    }

    pub fn score(&self, text: &str) -> usize {
        relevance_score(text, &self.index)
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.buffer.snapshot()
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    pub fn buffer(&self) -> &CircularBuffer {
        &self.buffer
    }
}

impl RelevanceSource for ContextWindow {
    fn relevance_scores(&self, texts: &[&str]) -> Vec<usize> {
        self.index.relevance_scores(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(capacity: usize) -> ContextWindow {
        ContextWindow::new(
            NonZeroUsize::new(capacity).unwrap(),
            Arc::new(StopWords::default()),
        )
    }

    #[test]
    fn test_capacity_three_scenario() {
        let mut window = window(3);
        for text in ["alpha beta", "beta gamma", "gamma delta", "delta epsilon"] {
            window.ingest(text);
        }

        assert_eq!(
            window.snapshot(),
            vec!["beta gamma", "gamma delta", "delta epsilon"]
        );
        assert_eq!(window.index().frequency("beta"), 1);
        assert_eq!(window.index().frequency("gamma"), 2);
        assert_eq!(window.index().frequency("delta"), 2);
        assert_eq!(window.index().frequency("epsilon"), 1);
        assert_eq!(window.score("gamma gamma"), 4);
    }

    #[test]
    fn test_evicted_messages_leave_the_index() {
        let mut window = window(2);
        window.ingest("zebra");
        assert_eq!(window.score("zebra"), 1);

        window.ingest("lion");
        window.ingest("tiger");
        assert_eq!(window.score("zebra"), 0);
        assert_eq!(window.score("lion tiger"), 2);
    }

    #[test]
    fn test_empty_window_scores_zero() {
        let window = window(5);
        assert_eq!(window.score("anything at all"), 0);
        assert!(window.index().is_empty());
    }
}
