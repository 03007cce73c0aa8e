//! Bag-of-words relevance scoring against a keyword index

use super::keywords::{tokenize, KeywordIndex};

/// Score `text` by summing the indexed frequency of each of its tokens
///
/// Query tokens are not stop-word filtered; stop words simply never appear
/// in the index. Repeated tokens count every time and the total is not
/// normalized by length.
pub fn relevance_score(text: &str, index: &KeywordIndex) -> usize {
    tokenize(text).map(|token| index.frequency(&token)).sum()
}

/// Anything that can rank message texts by relevance
pub trait RelevanceSource {
    /// Score each text against one consistent view of the window
    fn relevance_scores(&self, texts: &[&str]) -> Vec<usize>;
}

impl RelevanceSource for KeywordIndex {
    fn relevance_scores(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|text| relevance_score(text, self)).collect()
    }
}
