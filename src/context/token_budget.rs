//! Token budget enforcement by relevance-ordered eviction
//!
//! When a transcript exceeds its budget, non-pinned messages are evicted in
//! ascending relevance order until the transcript fits:
//! - System messages are pinned wherever they appear
//! - The final message is always kept
//! - Scores are computed once, before any eviction
//! - Equal scores evict the earlier message first
//! - The total is recounted in full after every eviction

use super::models::{PruneReport, Transcript};
use super::scorer::RelevanceSource;
use super::token_estimator::{EstimatorError, TokenEstimator};
use crate::metrics::METRICS;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Evicts low-relevance messages until a transcript fits a token budget
#[derive(Clone)]
pub struct TokenBudgetEnforcer {
    estimator: Arc<dyn TokenEstimator>,
}

impl TokenBudgetEnforcer {
    pub fn new(estimator: Arc<dyn TokenEstimator>) -> Self {
        Self { estimator }
    }

    /// Total encoder tokens across every message in the transcript
    pub fn transcript_tokens(&self, transcript: &Transcript) -> Result<usize, EstimatorError> {
        let texts: Vec<&str> = transcript.iter().map(|m| m.content()).collect();
        self.estimator.estimate_total(&texts)
    }

    /// Prune `transcript` in place so it fits within `max_tokens` if possible
    ///
    /// Encoder failures propagate and leave the transcript untouched. If the
    /// pinned messages alone exceed the budget the report says so; that is
    /// not an error.
    pub fn enforce(
        &self,
        transcript: &mut Transcript,
        relevance: &dyn RelevanceSource,
        max_tokens: usize,
    ) -> Result<PruneReport, EstimatorError> {
        let initial_tokens = self.transcript_tokens(transcript)?;
        METRICS.record_transcript_tokens(initial_tokens);

        if initial_tokens <= max_tokens {
            return Ok(PruneReport {
                initial_tokens,
                final_tokens: initial_tokens,
                max_tokens,
                removed: Vec::new(),
            });
        }

        let last_position = transcript.len().saturating_sub(1);
        let candidates: Vec<usize> = transcript
            .iter()
            .enumerate()
            .filter(|(position, message)| *position != last_position && !message.is_pinned())
            .map(|(position, _)| position)
            .collect();

        if candidates.is_empty() {
            warn!(
                tokens = initial_tokens,
                max_tokens, "Transcript over budget with nothing left to prune"
            );
            METRICS.record_prune(0, true);
            return Ok(PruneReport {
                initial_tokens,
                final_tokens: initial_tokens,
                max_tokens,
                removed: Vec::new(),
            });
        }

        info!(
            tokens = initial_tokens,
            max_tokens,
            candidates = candidates.len(),
            "Pruning transcript to fit token budget"
        );

        let texts: Vec<&str> = candidates
            .iter()
            .map(|&position| transcript.messages()[position].content())
            .collect();
        let scores = relevance.relevance_scores(&texts);

        // Stable: equal scores keep transcript order.
        let mut eviction_order: Vec<usize> = (0..candidates.len()).collect();
        eviction_order.sort_by_key(|&k| scores[k]);

        let mut evicted = vec![false; transcript.len()];
        let mut total = initial_tokens;
        for k in eviction_order {
            if total <= max_tokens {
                break;
            }
            let position = candidates[k];
            evicted[position] = true;

            let remaining: Vec<&str> = transcript
                .iter()
                .enumerate()
                .filter(|(p, _)| !evicted[*p])
                .map(|(_, m)| m.content())
                .collect();
            total = self.estimator.estimate_total(&remaining)?;

            debug!(position, score = scores[k], tokens = total, "Evicted message");
        }

        let removed = transcript.remove_positions(|position| evicted[position]);
        let report = PruneReport {
            initial_tokens,
            final_tokens: total,
            max_tokens,
            removed,
        };

        if report.within_budget() {
            info!(
                removed = report.removed.len(),
                tokens = report.final_tokens,
                "Transcript pruned within budget"
            );
        } else {
            warn!(
                removed = report.removed.len(),
                tokens = report.final_tokens,
                overage = report.overage(),
                "Pinned messages alone exceed token budget"
            );
        }
        METRICS.record_prune(report.removed.len(), !report.within_budget());

        Ok(report)
    }
}
