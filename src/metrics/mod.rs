//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_with_registry, Counter, CounterVec, Histogram, Opts, Registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Context window metrics
    pub context_ingestions: Counter,

    // Token budget metrics
    pub transcript_tokens: Histogram,
    pub prune_runs: Counter,
    pub prune_evictions: Counter,
    pub prune_overages: Counter,

    // Tagging metrics
    pub tagging_requests: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let context_ingestions = register_counter_with_registry!(
            Opts::new("context_ingestions_total", "Messages ingested into context windows"),
            registry
        )?;

        let transcript_tokens = register_histogram_with_registry!(
            "transcript_tokens",
            "Transcript size in tokens at budget check",
            vec![250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0, 32000.0],
            registry
        )?;

        let prune_runs = register_counter_with_registry!(
            Opts::new("prune_runs_total", "Budget enforcement passes that had to prune"),
            registry
        )?;

        let prune_evictions = register_counter_with_registry!(
            Opts::new("prune_evictions_total", "Messages evicted to fit the token budget"),
            registry
        )?;

        let prune_overages = register_counter_with_registry!(
            Opts::new("prune_overages_total", "Transcripts left over budget after pruning"),
            registry
        )?;

        let tagging_requests = register_counter_vec_with_registry!(
            Opts::new("tagging_requests_total", "Tag generation requests by outcome"),
            &["status"],
            registry
        )?;

        Ok(Self {
            registry,
            context_ingestions,
            transcript_tokens,
            prune_runs,
            prune_evictions,
            prune_overages,
            tagging_requests,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_ingestion(&self) {
        self.context_ingestions.inc();
    }

    pub fn record_transcript_tokens(&self, tokens: usize) {
        self.transcript_tokens.observe(tokens as f64);
    }

    /// Record a pruning pass
    pub fn record_prune(&self, evicted: usize, overage: bool) {
        self.prune_runs.inc();
        self.prune_evictions.inc_by(evicted as f64);
        if overage {
            self.prune_overages.inc();
        }
    }

    /// Record a tagging outcome ("tagged", "empty" or "defaulted")
    pub fn record_tagging(&self, status: &str) {
        self.tagging_requests.with_label_values(&[status]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}
