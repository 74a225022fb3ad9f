use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use embedgate_core::{MetricTags, MetricsRecorder, ServiceTier};
use serde::{Deserialize, Serialize};

use super::summary::{Samples, SummaryStats};

/// A metric name plus its tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricKey {
    pub name: String,
    pub provider: String,
    pub canonical_model: String,
    pub workload: ServiceTier,
}

impl MetricKey {
    fn new(name: &str, tags: &MetricTags) -> Self {
        Self {
            name: name.to_string(),
            provider: tags.provider.clone(),
            canonical_model: tags.canonical_model.clone(),
            workload: tags.workload,
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    counters: BTreeMap<MetricKey, u64>,
    global_counters: BTreeMap<String, u64>,
    summaries: BTreeMap<MetricKey, Samples>,
    timers: BTreeMap<MetricKey, Samples>,
}

/// Point-in-time copy of every series, suitable for logging or export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub counters: Vec<(MetricKey, u64)>,
    /// Untagged counters, by name.
    pub global_counters: Vec<(String, u64)>,
    pub summaries: Vec<(MetricKey, SummaryStats)>,
    /// Latency summaries, in microseconds.
    pub timers: Vec<(MetricKey, SummaryStats)>,
}

/// Process-local `MetricsRecorder`. Series are created on first use.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    inner: Mutex<Registry>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_registry<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        // A poisoned lock only means a panicking writer; the maps stay usable.
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Counter value, zero if never incremented.
    pub fn counter(&self, name: &str, tags: &MetricTags) -> u64 {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| r.counters.get(&key).copied().unwrap_or(0))
    }

    /// Counter summed over every tag combination.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.with_registry(|r| {
            r.counters
                .iter()
                .filter(|(k, _)| k.name == name)
                .map(|(_, v)| *v)
                .sum()
        })
    }

    /// Untagged counter value, zero if never incremented.
    pub fn global_counter(&self, name: &str) -> u64 {
        self.with_registry(|r| r.global_counters.get(name).copied().unwrap_or(0))
    }

    pub fn summary(&self, name: &str, tags: &MetricTags) -> SummaryStats {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| r.summaries.get(&key).map(Samples::stats).unwrap_or_default())
    }

    /// Summary value at the given percentile (0.0–1.0).
    pub fn summary_percentile(&self, name: &str, tags: &MetricTags, p: f64) -> f64 {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| r.summaries.get(&key).map(|s| s.percentile(p)).unwrap_or(0.0))
    }

    pub fn latency(&self, name: &str, tags: &MetricTags) -> SummaryStats {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| r.timers.get(&key).map(Samples::stats).unwrap_or_default())
    }

    /// Latency at the given percentile (0.0–1.0).
    pub fn latency_percentile(&self, name: &str, tags: &MetricTags, p: f64) -> Duration {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| {
            r.timers
                .get(&key)
                .map(|s| Duration::from_micros(s.percentile(p).max(0.0) as u64))
                .unwrap_or(Duration::ZERO)
        })
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.with_registry(|r| MetricsSnapshot {
            counters: r.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            global_counters: r
                .global_counters
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            summaries: r
                .summaries
                .iter()
                .map(|(k, s)| (k.clone(), s.stats()))
                .collect(),
            timers: r.timers.iter().map(|(k, s)| (k.clone(), s.stats())).collect(),
        })
    }

    pub fn reset(&self) {
        self.with_registry(|r| *r = Registry::default());
    }
}

impl MetricsRecorder for InMemoryMetrics {
    fn increment_counter(&self, name: &str, tags: &MetricTags, by: u64) {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| *r.counters.entry(key).or_default() += by);
    }

    fn increment_global_counter(&self, name: &str, by: u64) {
        self.with_registry(|r| *r.global_counters.entry(name.to_string()).or_default() += by);
    }

    fn record_value(&self, name: &str, tags: &MetricTags, value: f64) {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| r.summaries.entry(key).or_default().record(value));
    }

    fn record_duration(&self, name: &str, tags: &MetricTags, duration: Duration) {
        let key = MetricKey::new(name, tags);
        self.with_registry(|r| {
            r.timers
                .entry(key)
                .or_default()
                .record(duration.as_micros() as f64)
        });
    }
}
