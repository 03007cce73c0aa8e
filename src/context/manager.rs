//! Conversation-keyed registry of relevance windows
//!
//! Windows are created on first reference and held in a bounded cache so
//! long-running processes do not accumulate idle conversations. Each window
//! sits behind its own mutex; concurrent turns on one conversation serialize,
//! separate conversations do not contend.

use super::keywords::StopWords;
use super::scorer::RelevanceSource;
use super::window::ContextWindow;
use crate::config::{ContextConfig, RegistryConfig};
use crate::error::{ContextError, Result};
use crate::metrics::METRICS;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type SharedWindow = Arc<Mutex<ContextWindow>>;

/// Registry of per-conversation context windows
#[derive(Clone)]
pub struct ContextManager {
    windows: Cache<String, SharedWindow>,
    capacity: NonZeroUsize,
    stop_words: Arc<StopWords>,
}

impl ContextManager {
    /// Create a registry from configuration
    pub fn new(context: &ContextConfig, registry: &RegistryConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(context.buffer_capacity).ok_or_else(|| {
            ContextError::Configuration("buffer capacity must be at least 1".to_string())
        })?;
        if registry.max_conversations == 0 {
            return Err(ContextError::Configuration(
                "registry must hold at least one conversation".to_string(),
            ));
        }

        // LRU: a new conversation is always admitted, the stalest one goes.
        let mut builder = Cache::builder()
            .max_capacity(registry.max_conversations)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(idle) = registry.idle_timeout() {
            builder = builder.time_to_idle(idle);
        }

        Ok(Self {
            windows: builder.build(),
            capacity,
            stop_words: Arc::new(StopWords::new(&context.stop_words)),
        })
    }

    /// Create with default window and registry settings
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ContextConfig::default(), &RegistryConfig::default())
    }

    /// Ingest a message into the conversation's window
    pub fn update_context(&self, conversation_id: &str, text: &str) {
        let window = self.window(conversation_id);
        lock(&window).ingest(text);
        METRICS.record_ingestion();
    }

    /// Score a text against the conversation's current window
    pub fn get_relevance_score(&self, conversation_id: &str, text: &str) -> usize {
        let window = self.window(conversation_id);
        let score = lock(&window).score(text);
        score
    }

    /// Score several texts against a single snapshot of the window
    pub fn score_many(&self, conversation_id: &str, texts: &[&str]) -> Vec<usize> {
        let window = self.window(conversation_id);
        let scores = lock(&window).relevance_scores(texts);
        scores
    }

    /// Buffered message texts, oldest first
    pub fn snapshot(&self, conversation_id: &str) -> Vec<String> {
        let window = self.window(conversation_id);
        let snapshot = lock(&window).snapshot();
        snapshot
    }

    /// Run `f` with exclusive access to the conversation's window
    pub fn with_window<T>(&self, conversation_id: &str, f: impl FnOnce(&mut ContextWindow) -> T) -> T {
        let window = self.window(conversation_id);
        let mut guard = lock(&window);
        f(&mut guard)
    }

    /// Drop a conversation's window
    pub fn remove(&self, conversation_id: &str) {
        self.windows.invalidate(conversation_id);
        debug!(conversation_id, "Context window removed");
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.windows.contains_key(conversation_id)
    }

    /// Approximate number of live windows
    pub fn len(&self) -> u64 {
        self.windows.run_pending_tasks();
        self.windows.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn window(&self, conversation_id: &str) -> SharedWindow {
        self.windows.get_with_by_ref(conversation_id, || {
            debug!(conversation_id, "Creating context window");
            Arc::new(Mutex::new(ContextWindow::new(
                self.capacity,
                Arc::clone(&self.stop_words),
            )))
        })
    }
}

fn lock(window: &Mutex<ContextWindow>) -> MutexGuard<'_, ContextWindow> {
    window.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn manager(capacity: usize) -> ContextManager {
        let context = ContextConfig {
            buffer_capacity: capacity,
            ..ContextConfig::default()
        };
        ContextManager::new(&context, &RegistryConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let context = ContextConfig {
            buffer_capacity: 0,
            ..ContextConfig::default()
        };
        let result = ContextManager::new(&context, &RegistryConfig::default());
        assert!(matches!(result, Err(ContextError::Configuration(_))));
    }

    #[test]
    fn test_unknown_conversation_scores_zero() {
        let manager = manager(3);
        assert_eq!(manager.get_relevance_score("missing", "anything"), 0);
        assert!(manager.contains("missing"));
    }

    #[test]
    fn test_update_then_score() {
        let manager = manager(3);
        for text in ["alpha beta", "beta gamma", "gamma delta", "delta epsilon"] {
            manager.update_context("conv-1", text);
        }
        assert_eq!(manager.get_relevance_score("conv-1", "gamma gamma"), 4);
        assert_eq!(manager.get_relevance_score("conv-1", "alpha"), 0);
        assert_eq!(
            manager.snapshot("conv-1"),
            vec!["beta gamma", "gamma delta", "delta epsilon"]
        );
    }

    #[test]
    fn test_conversations_are_isolated() {
        let manager = manager(5);
        manager.update_context("a", "rust ownership");
        manager.update_context("b", "python decorators");

        assert_eq!(manager.get_relevance_score("a", "rust"), 1);
        assert_eq!(manager.get_relevance_score("b", "rust"), 0);
        assert_eq!(manager.score_many("b", &["python", "ownership"]), vec![1, 0]);
    }

    #[test]
    fn test_remove_resets_window() {
        let manager = manager(5);
        manager.update_context("a", "kernel scheduler");
        manager.remove("a");
        assert_eq!(manager.get_relevance_score("a", "kernel"), 0);
    }

    #[test]
    fn test_registry_is_bounded() {
        let registry = RegistryConfig {
            max_conversations: 4,
            idle_timeout_secs: None,
        };
        let manager = ContextManager::new(&ContextConfig::default(), &registry).unwrap();
        for i in 0..64 {
            manager.update_context(&format!("conv-{i}"), "hello");
        }
        assert!(manager.len() <= 4);
    }

    #[test]
    fn test_new_conversation_admitted_when_registry_full_of_hot_ids() {
        let registry = RegistryConfig {
            max_conversations: 512,
            idle_timeout_secs: None,
        };
        let manager = ContextManager::new(&ContextConfig::default(), &registry).unwrap();
        for _ in 0..10 {
            for i in 0..512 {
                manager.update_context(&format!("hot-{i}"), "alpha");
            }
        }

        for text in ["kernel", "scheduler", "kernel"] {
            manager.update_context("new-c", text);
        }

        assert_eq!(manager.get_relevance_score("new-c", "kernel"), 2);
        assert_eq!(manager.snapshot("new-c").len(), 3);
        assert!(manager.len() <= 512);
    }

    #[test]
    fn test_concurrent_updates_on_one_conversation() {
        let manager = manager(1000);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        manager.update_context("shared", "token");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(manager.get_relevance_score("shared", "token"), 400);
    }
}
