mod client_factory;
mod metrics_recorder;
mod provider_client;

pub use client_factory::ClientFactory;
pub use metrics_recorder::{MetricTags, MetricsRecorder, NoopMetrics};
pub use provider_client::ProviderClient;
