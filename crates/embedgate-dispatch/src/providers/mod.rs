//! Provider clients and the factory that builds them.

pub mod voyage;
pub mod voyage_schema;

use std::sync::Arc;

use embedgate_core::{
    CanonicalModelConfig, ClientFactory, EmbeddingError, EmbeddingProvider, EmbeddingResult,
    MetricsRecorder, ProviderClient, ServiceTier, WorkloadParams,
};
use tracing::info;

use crate::metrics::TierMetrics;

pub use voyage::VoyageClient;

/// Builds the client for each supported provider.
pub struct DefaultClientFactory {
    metrics: Arc<dyn MetricsRecorder>,
}

impl DefaultClientFactory {
    pub fn new(metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { metrics }
    }
}

impl ClientFactory for DefaultClientFactory {
    fn create_client(
        &self,
        model: &CanonicalModelConfig,
        tier: ServiceTier,
        params: &WorkloadParams,
    ) -> EmbeddingResult<Arc<dyn ProviderClient>> {
        match model.provider {
            EmbeddingProvider::Voyage => {
                info!(model = %model.name, tier = %tier, "creating voyage client");
                let metrics =
                    TierMetrics::new(Arc::clone(&self.metrics), model.provider, &model.name, tier);
                Ok(Arc::new(VoyageClient::new(model, tier, params, metrics)))
            }
            other => Err(EmbeddingError::invalid_config(format!(
                "no client available for provider {other}"
            ))),
        }
    }
}

impl std::fmt::Debug for DefaultClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultClientFactory").finish()
    }
}
