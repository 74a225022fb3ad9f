//! Metrics collection: counters, value distributions, and request latency.

mod in_memory;
mod summary;

pub use in_memory::{InMemoryMetrics, MetricKey, MetricsSnapshot};
pub use summary::SummaryStats;
