//! # embedgate-core
//!
//! Foundation crate for the embedgate dispatch layer.
//! Defines config, errors, value types, and the collaborator traits
//! (provider clients, client factories, metrics recorders).
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{
    CanonicalModelConfig, EmbeddingConfig, EmbeddingProvider, EmbeddingServiceConfig,
    ServiceConfigSet, ServiceTier, WorkloadParams,
};
pub use errors::{EmbeddingError, EmbeddingResult};
pub use models::{RequestContext, VectorOrError};
pub use traits::{ClientFactory, MetricTags, MetricsRecorder, ProviderClient};
