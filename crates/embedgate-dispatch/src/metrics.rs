//! Metric names and per-tier recording helpers.

use std::sync::Arc;
use std::time::Duration;

use embedgate_core::{EmbeddingProvider, MetricTags, MetricsRecorder, ServiceTier};

pub const SUCCESSFUL_REQUESTS: &str = "successfulRequests";
pub const FAILED_REQUESTS: &str = "failedRequests";
pub const REQUEST_LATENCY: &str = "requestLatency";
pub const BATCH_SIZE_DISTRIBUTION: &str = "batchSizePerRequestDistribution";
pub const RETRIED_ATTEMPTS: &str = "retriedAttempts";
pub const ATTEMPTS_PER_REQUEST: &str = "attemptsPerRequestDistribution";
pub const TOKEN_ESTIMATION_FAILS: &str = "tokenEstimationFailsCounter";
pub const INPUT_TOKEN_DISTRIBUTION: &str = "inputTokenDistribution";
pub const INVALID_REQUESTS: &str = "invalidRequestCounter";

/// Recorder bound to one `(provider, canonicalModel, workload)` tag set.
#[derive(Clone)]
pub struct TierMetrics {
    recorder: Arc<dyn MetricsRecorder>,
    tags: MetricTags,
}

impl TierMetrics {
    pub fn new(
        recorder: Arc<dyn MetricsRecorder>,
        provider: EmbeddingProvider,
        canonical_model: &str,
        tier: ServiceTier,
    ) -> Self {
        Self {
            recorder,
            tags: MetricTags::new(provider.as_str(), canonical_model, tier),
        }
    }

    pub fn tags(&self) -> &MetricTags {
        &self.tags
    }

    pub fn success(&self) {
        self.recorder
            .increment_counter(SUCCESSFUL_REQUESTS, &self.tags, 1);
    }

    pub fn failure(&self) {
        self.recorder.increment_counter(FAILED_REQUESTS, &self.tags, 1);
    }

    pub fn batch_size(&self, texts: usize) {
        self.recorder
            .record_value(BATCH_SIZE_DISTRIBUTION, &self.tags, texts as f64);
    }

    pub fn latency(&self, elapsed: Duration) {
        self.recorder
            .record_duration(REQUEST_LATENCY, &self.tags, elapsed);
    }

    pub fn retried(&self) {
        self.recorder.increment_counter(RETRIED_ATTEMPTS, &self.tags, 1);
    }

    pub fn attempts(&self, attempts: u32) {
        self.recorder
            .record_value(ATTEMPTS_PER_REQUEST, &self.tags, f64::from(attempts));
    }

    pub fn input_tokens(&self, tokens: u64) {
        self.recorder
            .record_value(INPUT_TOKEN_DISTRIBUTION, &self.tags, tokens as f64);
    }

    pub fn invalid_request(&self) {
        self.recorder.increment_counter(INVALID_REQUESTS, &self.tags, 1);
    }
}

/// Untagged counter shared by every model and tier.
#[derive(Clone)]
pub struct GlobalCounter {
    recorder: Arc<dyn MetricsRecorder>,
    name: &'static str,
}

impl GlobalCounter {
    pub fn new(recorder: Arc<dyn MetricsRecorder>, name: &'static str) -> Self {
        Self { recorder, name }
    }

    pub fn increment(&self) {
        self.recorder.increment_global_counter(self.name, 1);
    }
}

impl std::fmt::Debug for GlobalCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalCounter").field("name", &self.name).finish()
    }
}

impl std::fmt::Debug for TierMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierMetrics").field("tags", &self.tags).finish()
    }
}
