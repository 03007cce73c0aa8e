//! Per-turn orchestration: ingest, score, prune

use crate::config::Config;
use crate::context::{
    ContextManager, Message, PruneReport, Role, TiktokenEstimator, TokenBudgetEnforcer,
    TokenEstimator, Transcript,
};
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the conversation registry, the encoder and the token budget
#[derive(Clone)]
pub struct ContextService {
    manager: ContextManager,
    enforcer: TokenBudgetEnforcer,
    max_tokens: usize,
}

impl ContextService {
    pub fn new(manager: ContextManager, estimator: Arc<dyn TokenEstimator>, max_tokens: usize) -> Self {
        Self {
            manager,
            enforcer: TokenBudgetEnforcer::new(estimator),
            max_tokens,
        }
    }

    /// Build the service from configuration using a tiktoken encoder
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let manager = ContextManager::new(&config.context, &config.registry)?;
        let estimator = TiktokenEstimator::for_encoding(&config.budget.encoding)?;

        info!(
            buffer_capacity = config.context.buffer_capacity,
            max_tokens = config.budget.max_tokens,
            encoding = %config.budget.encoding,
            "Context service initialized"
        );

        Ok(Self::new(manager, Arc::new(estimator), config.budget.max_tokens))
    }

    /// Ingest a message into the conversation's relevance window
    pub fn update_context(&self, conversation_id: &str, text: &str) {
        self.manager.update_context(conversation_id, text);
    }

    /// Score a text against the conversation's relevance window
    pub fn get_relevance_score(&self, conversation_id: &str, text: &str) -> usize {
        self.manager.get_relevance_score(conversation_id, text)
    }

    /// Prune `transcript` in place to fit `max_tokens`
    ///
    /// The conversation's window is locked for the duration, so scores come
    /// from one consistent snapshot.
    pub fn enforce_budget(
        &self,
        conversation_id: &str,
        transcript: &mut Transcript,
        max_tokens: usize,
    ) -> Result<PruneReport> {
        let report = self.manager.with_window(conversation_id, |window| {
            self.enforcer.enforce(transcript, &*window, max_tokens)
        })?;

        debug!(
            conversation_id,
            removed = report.removed.len(),
            tokens = report.final_tokens,
            "Budget enforced"
        );
        Ok(report)
    }

    /// Append a message, ingest it, then enforce the configured budget
    ///
    /// The message is appended before pruning so it is always the pinned
    /// final entry.
    ///
    /// On error the message has already been ingested and pushed onto
    /// `transcript`; retrying the call would record it twice. Call
    /// [`enforce_budget`](Self::enforce_budget) to retry only the pruning.
    pub fn record_message(
        &self,
        conversation_id: &str,
        transcript: &mut Transcript,
        role: Role,
        content: impl Into<String>,
    ) -> Result<PruneReport> {
        let message = Message::new(role, content);
        self.update_context(conversation_id, message.content());
        transcript.push(message);
        self.enforce_budget(conversation_id, transcript, self.max_tokens)
    }

    /// Total encoder tokens in the transcript
    pub fn transcript_tokens(&self, transcript: &Transcript) -> Result<usize> {
        Ok(self.enforcer.transcript_tokens(transcript)?)
    }

    /// Drop a finished conversation's window
    pub fn end_conversation(&self, conversation_id: &str) {
        self.manager.remove(conversation_id);
    }

    pub fn manager(&self) -> &ContextManager {
        &self.manager
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WordBasedEstimator;

    fn service(max_tokens: usize) -> ContextService {
        ContextService::new(
            ContextManager::with_defaults().unwrap(),
            Arc::new(WordBasedEstimator::new(1.0)),
            max_tokens,
        )
    }

    #[test]
    fn test_record_message_ingests_and_appends() {
        let service = service(100);
        let mut transcript = Transcript::with_system_prompt("You are terse");

        let report = service
            .record_message("c1", &mut transcript, Role::User, "tell me about rust")
            .unwrap();

        assert!(!report.pruned());
        assert_eq!(transcript.len(), 2);
        assert_eq!(service.get_relevance_score("c1", "rust rust"), 2);
    }

    #[test]
    fn test_record_message_prunes_least_relevant() {
        let service = service(9);
        let mut transcript = Transcript::with_system_prompt("sys");

        service
            .record_message("c1", &mut transcript, Role::User, "gardening tips please")
            .unwrap();
        service
            .record_message("c1", &mut transcript, Role::Assistant, "rust borrow checker")
            .unwrap();
        let report = service
            .record_message("c1", &mut transcript, Role::User, "more rust borrow")
            .unwrap();

        let contents: Vec<&str> = transcript.iter().map(Message::content).collect();
        assert_eq!(contents, vec!["sys", "rust borrow checker", "more rust borrow"]);
        assert_eq!(report.removed, vec![Message::user("gardening tips please")]);
        assert!(report.within_budget());
    }

    #[test]
    fn test_end_conversation_forgets_window() {
        let service = service(100);
        service.update_context("c1", "kubernetes");
        service.end_conversation("c1");
        assert_eq!(service.get_relevance_score("c1", "kubernetes"), 0);
    }
}
