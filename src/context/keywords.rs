//! Keyword frequency index over the buffered window

use indexmap::IndexMap;
use std::collections::HashSet;

/// Words never counted as keywords
pub const DEFAULT_STOP_WORDS: &[&str] = &["the", "is", "and", "to", "a", "of"];

/// Split text into lowercase word tokens
///
/// The whole text is lowercased first, then split into maximal runs of word
/// characters. Lowercasing can change a character's class (`İ` becomes `i`
/// plus a combining dot), so splitting happens on the lowercased form.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<String> = lowered
        .split(|c: char| !is_word_char(c))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect();
    tokens.into_iter()
}

/// A word character is `_` or anything [`char::is_alphanumeric`] accepts:
/// the Unicode `Alphabetic` and `Numeric` properties. `Alphabetic` covers
/// the vowel signs of Indic scripts, so `हिंदी` is one token.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive stop-word set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}

/// Token → occurrence count across every buffered message
///
/// Always rebuilt from scratch; it carries nothing beyond the texts it was
/// built from. Iteration order is first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordIndex {
    frequencies: IndexMap<String, usize>,
}

impl KeywordIndex {
    /// Build the index from a window snapshot
    pub fn build<'a, I>(texts: I, stop_words: &StopWords) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut frequencies = IndexMap::new();
        for text in texts {
            for token in tokenize(text) {
                if stop_words.contains(&token) {
                    continue;
                }
                *frequencies.entry(token).or_insert(0) += 1;
            }
        }
        Self { frequencies }
    }

    /// Indexed frequency of a token, 0 if absent
    pub fn frequency(&self, token: &str) -> usize {
        self.frequencies.get(token).copied().unwrap_or(0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.frequencies.contains_key(token)
    }

    /// Number of distinct keywords
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Sum of all keyword occurrences
    pub fn total_occurrences(&self) -> usize {
        self.frequencies.values().sum()
    }

    /// Highest-frequency keywords; ties keep first-appearance order
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .frequencies
            .iter()
            .map(|(token, count)| (token.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.frequencies
            .iter()
            .map(|(token, count)| (token.as_str(), *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        let tokens: Vec<String> = tokenize("Hello, World! snake_case x2").collect();
        assert_eq!(tokens, vec!["hello", "world", "snake_case", "x2"]);
    }

    #[test]
    fn test_tokenize_unicode_words() {
        let tokens: Vec<String> = tokenize("Café — naïve").collect();
        assert_eq!(tokens, vec!["café", "naïve"]);
    }

    #[test]
    fn test_tokenize_lowercases_before_splitting() {
        let tokens: Vec<String> = tokenize("ÀB Ωmega").collect();
        assert_eq!(tokens, vec!["àb", "ωmega"]);

        for text in ["İstanbul trip", "ŞEHİR merkezi", "MIXED_case ΣΊΣΥΦΟΣ"] {
            let direct: Vec<String> = tokenize(text).collect();
            let prelowered: Vec<String> = tokenize(&text.to_lowercase()).collect();
            assert_eq!(direct, prelowered, "{text}");
        }
    }

    #[test]
    fn test_tokenize_keeps_combining_vowel_signs_in_word() {
        let tokens: Vec<String> = tokenize("हिंदी भाषा").collect();
        assert_eq!(tokens, vec!["हिंदी", "भाषा"]);
    }

    #[test]
    fn test_tokenize_empty_and_punctuation() {
        assert_eq!(tokenize("").count(), 0);
        assert_eq!(tokenize("... !!! ,,,").count(), 0);
    }

    #[test]
    fn test_build_excludes_stop_words() {
        let index = KeywordIndex::build(
            ["The cat is on the mat", "a cat and a dog"],
            &StopWords::default(),
        );
        assert_eq!(index.frequency("cat"), 2);
        assert_eq!(index.frequency("mat"), 1);
        assert_eq!(index.frequency("on"), 1);
        assert!(!index.contains("the"));
        assert!(!index.contains("a"));
        assert!(!index.contains("and"));
    }

    #[test]
    fn test_stop_words_are_case_insensitive() {
        let stop_words = StopWords::new(["THE"]);
        let index = KeywordIndex::build(["The end"], &stop_words);
        assert!(!index.contains("the"));
        assert_eq!(index.frequency("end"), 1);
    }

    #[test]
    fn test_window_scenario_frequencies() {
        let index = KeywordIndex::build(
            ["beta gamma", "gamma delta", "delta epsilon"],
            &StopWords::default(),
        );
        assert_eq!(index.frequency("beta"), 1);
        assert_eq!(index.frequency("gamma"), 2);
        assert_eq!(index.frequency("delta"), 2);
        assert_eq!(index.frequency("epsilon"), 1);
        assert_eq!(index.frequency("alpha"), 0);
        assert_eq!(index.len(), 4);
        assert_eq!(index.total_occurrences(), 6);
    }

    #[test]
    fn test_most_common_orders_by_count_then_appearance() {
        let index = KeywordIndex::build(
            ["beta gamma", "gamma delta", "delta epsilon"],
            &StopWords::default(),
        );
        assert_eq!(index.most_common(2), vec![("gamma", 2), ("delta", 2)]);
    }

    #[test]
    fn test_empty_index() {
        let index = KeywordIndex::build(std::iter::empty::<&str>(), &StopWords::default());
        assert!(index.is_empty());
        assert_eq!(index.frequency("anything"), 0);
    }
}
