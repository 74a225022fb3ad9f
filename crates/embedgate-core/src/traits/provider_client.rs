use crate::config::WorkloadParams;
use crate::errors::EmbeddingResult;
use crate::models::{RequestContext, VectorOrError};

/// A vendor API client bound to one tier of one canonical model.
///
/// Calls are blocking; async callers run them on a blocking pool.
pub trait ProviderClient: Send + Sync {
    /// Embed a batch. The output has one entry per input, in input order.
    /// Per-text failures are `VectorOrError::Error`; whole-batch failures are
    /// returned as `Err`.
    fn embed(&self, texts: &[String], ctx: &RequestContext)
        -> EmbeddingResult<Vec<VectorOrError>>;

    /// Apply new workload parameters in place.
    fn update_config(&self, params: &WorkloadParams) -> EmbeddingResult<()>;
}
