//! # embedgate-dispatch
//!
//! Turns lists of texts into embeddings by routing them to the provider
//! client registered for a canonical model. Handles size/token-bounded
//! batching, per-credential client-side rate limiting, exponential-backoff
//! retry of transient failures, one-shot rebatching of oversized batches,
//! and hot reconfiguration of registered models.

pub mod batching;
pub mod metrics;
pub mod provider_manager;
pub mod providers;
pub mod rate_limit;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod service_manager;

pub use batching::generate_batches;
pub use provider_manager::ProviderManager;
pub use providers::DefaultClientFactory;
pub use registry::{ManagerDeps, ServiceRegistry};
pub use scheduler::{EmbedTask, TaskScheduler};
pub use service_manager::EmbeddingServiceManager;
