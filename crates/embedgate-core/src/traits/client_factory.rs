use std::sync::Arc;

use super::ProviderClient;
use crate::config::{CanonicalModelConfig, ServiceTier, WorkloadParams};
use crate::errors::EmbeddingResult;

/// Builds provider clients. Injected so tests can substitute fakes.
pub trait ClientFactory: Send + Sync {
    fn create_client(
        &self,
        model: &CanonicalModelConfig,
        tier: ServiceTier,
        params: &WorkloadParams,
    ) -> EmbeddingResult<Arc<dyn ProviderClient>>;
}
