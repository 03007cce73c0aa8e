//! Fixed-capacity FIFO window over recent message texts

use crate::error::{ContextError, Result};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Default number of messages held per conversation
pub const DEFAULT_BUFFER_CAPACITY: usize = 50;

/// Circular buffer of message contents
///
/// Once full, each `add` discards the oldest entry. Eviction ignores
/// content and relevance entirely.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    entries: VecDeque<String>,
    capacity: NonZeroUsize,
}

impl CircularBuffer {
    /// Create a buffer holding at most `capacity` messages
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            ContextError::Configuration("buffer capacity must be at least 1".to_string())
        })?;
        Ok(Self::with_capacity(capacity))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Append a message, returning the evicted entry if the buffer was full
    pub fn add(&mut self, text: impl Into<String>) -> Option<String> {
        let evicted = if self.entries.len() == self.capacity.get() {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(text.into());
        evicted
    }

    /// Current contents, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl Default for CircularBuffer {
    fn default() -> Self {
        Self::with_capacity(
            NonZeroUsize::new(DEFAULT_BUFFER_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        )
    }
}
