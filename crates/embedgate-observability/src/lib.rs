//! # embedgate-observability
//!
//! Metrics collection for the dispatch layer (counters, value summaries,
//! latency percentiles keyed by provider, model, and workload) and structured
//! JSON tracing setup.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::{InMemoryMetrics, MetricKey, MetricsSnapshot, SummaryStats};
