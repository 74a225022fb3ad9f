//! Resolved per-model configuration: the base config with each tier's
//! overrides applied.

use std::collections::BTreeMap;

use super::credentials::{ApiKeyCredentials, TenantWorkloadCredentials};
use super::service_config::{EmbeddingConfig, ErrorHandlingConfig, ModelConfig};
use super::tier::{EmbeddingProvider, ServiceTier};
use crate::errors::{EmbeddingError, EmbeddingResult};

/// Everything a tier's client and retry pipeline need. Immutable; an update
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadParams {
    pub model_config: ModelConfig,
    pub error_handling: ErrorHandlingConfig,
    pub credentials: ApiKeyCredentials,
    pub provider_endpoint: Option<String>,
    /// Dedicated-cluster credentials that take precedence over `credentials`.
    pub tenant_credentials: Option<ApiKeyCredentials>,
    pub per_tenant_credentials: Option<BTreeMap<String, TenantWorkloadCredentials>>,
    pub is_dedicated_cluster: bool,
}

impl WorkloadParams {
    fn consolidate(base: &EmbeddingConfig, tier: ServiceTier) -> Self {
        let overrides = base.overrides_for(tier);

        let model_config = match overrides.and_then(|o| o.model_config.as_ref()) {
            Some(o) => base.model_config.overlay(o),
            None => base.model_config.clone(),
        };
        let error_handling = overrides
            .and_then(|o| o.error_handling_config.clone())
            .unwrap_or_else(|| base.error_handling_config.clone());
        let credentials = overrides
            .and_then(|o| o.credentials.clone())
            .unwrap_or_else(|| base.credentials.clone());

        Self {
            model_config,
            error_handling,
            credentials,
            provider_endpoint: base.provider_endpoint.clone(),
            tenant_credentials: overrides.and_then(|o| o.tenant_credentials.clone()),
            per_tenant_credentials: base.tenant_credentials.clone(),
            is_dedicated_cluster: base.is_dedicated_cluster,
        }
    }

    fn validate(&self, tier: ServiceTier) -> EmbeddingResult<()> {
        if self.model_config.batch_size() == 0 {
            return Err(EmbeddingError::invalid_config(format!(
                "{tier}: batchSize must be positive"
            )));
        }
        if self.model_config.batch_token_limit() == 0 {
            return Err(EmbeddingError::invalid_config(format!(
                "{tier}: batchTokenLimit must be positive"
            )));
        }
        let eh = &self.error_handling;
        if !(0.0..=1.0).contains(&eh.jitter) {
            return Err(EmbeddingError::invalid_config(format!(
                "{tier}: jitter must be within [0, 1], got {}",
                eh.jitter
            )));
        }
        if eh.initial_retry_wait_ms > eh.max_retry_wait_ms {
            return Err(EmbeddingError::invalid_config(format!(
                "{tier}: initialRetryWaitMs {} exceeds maxRetryWaitMs {}",
                eh.initial_retry_wait_ms, eh.max_retry_wait_ms
            )));
        }
        Ok(())
    }
}

/// Resolved config of one canonical model. Equality is structural and is
/// what decides whether a reload is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalModelConfig {
    pub name: String,
    pub provider: EmbeddingProvider,
    pub query: WorkloadParams,
    pub change_stream: WorkloadParams,
    pub collection_scan: WorkloadParams,
}

impl CanonicalModelConfig {
    pub fn create(
        name: impl Into<String>,
        provider: EmbeddingProvider,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            query: WorkloadParams::consolidate(config, ServiceTier::Query),
            change_stream: WorkloadParams::consolidate(config, ServiceTier::ChangeStream),
            collection_scan: WorkloadParams::consolidate(config, ServiceTier::CollectionScan),
        }
    }

    pub fn workload(&self, tier: ServiceTier) -> &WorkloadParams {
        match tier {
            ServiceTier::Query => &self.query,
            ServiceTier::ChangeStream => &self.change_stream,
            ServiceTier::CollectionScan => &self.collection_scan,
        }
    }

    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.name.trim().is_empty() {
            return Err(EmbeddingError::invalid_config("model name must not be empty"));
        }
        for tier in ServiceTier::ALL {
            self.workload(tier).validate(tier)?;
        }
        Ok(())
    }
}
