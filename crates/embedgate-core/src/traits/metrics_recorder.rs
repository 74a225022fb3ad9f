use std::time::Duration;

use crate::config::ServiceTier;

/// Dimensions every dispatch metric is tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricTags {
    pub provider: String,
    pub canonical_model: String,
    pub workload: ServiceTier,
}

impl MetricTags {
    pub fn new(
        provider: impl Into<String>,
        canonical_model: impl Into<String>,
        workload: ServiceTier,
    ) -> Self {
        Self {
            provider: provider.into(),
            canonical_model: canonical_model.into(),
            workload,
        }
    }
}

/// Sink for dispatch metrics.
pub trait MetricsRecorder: Send + Sync {
    fn increment_counter(&self, name: &str, tags: &MetricTags, by: u64);

    /// Increment a process-wide counter that carries no tags.
    fn increment_global_counter(&self, name: &str, by: u64);

    /// Record one sample into a distribution summary.
    fn record_value(&self, name: &str, tags: &MetricTags, value: f64);

    fn record_duration(&self, name: &str, tags: &MetricTags, duration: Duration);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn increment_counter(&self, _name: &str, _tags: &MetricTags, _by: u64) {}

    fn increment_global_counter(&self, _name: &str, _by: u64) {}

    fn record_value(&self, _name: &str, _tags: &MetricTags, _value: f64) {}

    fn record_duration(&self, _name: &str, _tags: &MetricTags, _duration: Duration) {}
}
