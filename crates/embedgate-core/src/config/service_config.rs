//! Configuration as delivered by the control plane or a bootstrap file:
//! one base config per model plus optional per-tier overrides.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::credentials::{ApiKeyCredentials, TenantWorkloadCredentials};
use super::defaults;
use super::tier::{EmbeddingProvider, ServiceTier};
use crate::errors::{EmbeddingError, EmbeddingResult};

/// Truncation behaviour requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruncationOption {
    None,
    Start,
    End,
}

/// Model parameters. Every field is optional so a tier override can set
/// just the fields it cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(default)]
    pub output_dimensions: Option<u32>,
    #[serde(default)]
    pub truncation: Option<TruncationOption>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub batch_token_limit: Option<u32>,
}

impl ModelConfig {
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(defaults::DEFAULT_BATCH_SIZE)
    }

    pub fn batch_token_limit(&self) -> u32 {
        self.batch_token_limit
            .unwrap_or(defaults::DEFAULT_BATCH_TOKEN_LIMIT)
    }

    pub fn output_dimensions(&self) -> u32 {
        self.output_dimensions
            .unwrap_or(defaults::DEFAULT_OUTPUT_DIMENSIONS)
    }

    /// Field-by-field overlay: a field set in `overrides` wins.
    pub fn overlay(&self, overrides: &ModelConfig) -> ModelConfig {
        ModelConfig {
            output_dimensions: overrides.output_dimensions.or(self.output_dimensions),
            truncation: overrides.truncation.or(self.truncation),
            batch_size: overrides.batch_size.or(self.batch_size),
            batch_token_limit: overrides.batch_token_limit.or(self.batch_token_limit),
        }
    }
}

/// Retry parameters for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlingConfig {
    pub max_retries: u32,
    pub initial_retry_wait_ms: u64,
    pub max_retry_wait_ms: u64,
    pub jitter: f64,
}

impl ErrorHandlingConfig {
    pub fn new(
        max_retries: u32,
        initial_retry_wait_ms: u64,
        max_retry_wait_ms: u64,
        jitter: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_retry_wait_ms,
            max_retry_wait_ms,
            jitter,
        }
    }
}

impl Default for ErrorHandlingConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            initial_retry_wait_ms: defaults::DEFAULT_INITIAL_RETRY_WAIT_MS,
            max_retry_wait_ms: defaults::DEFAULT_MAX_RETRY_WAIT_MS,
            jitter: defaults::DEFAULT_JITTER,
        }
    }
}

/// Optional per-tier overrides of the base config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadOverrides {
    #[serde(default)]
    pub model_config: Option<ModelConfig>,
    #[serde(default)]
    pub error_handling_config: Option<ErrorHandlingConfig>,
    #[serde(default)]
    pub credentials: Option<ApiKeyCredentials>,
    #[serde(default)]
    pub tenant_credentials: Option<ApiKeyCredentials>,
}

impl WorkloadOverrides {
    pub fn copy_sanitized(&self, placeholder: &str) -> Self {
        Self {
            model_config: self.model_config.clone(),
            error_handling_config: self.error_handling_config.clone(),
            credentials: self
                .credentials
                .as_ref()
                .map(|c| c.copy_sanitized(placeholder)),
            tenant_credentials: self
                .tenant_credentials
                .as_ref()
                .map(|c| c.copy_sanitized(placeholder)),
        }
    }
}

fn default_dedicated() -> bool {
    defaults::DEFAULT_IS_DEDICATED_CLUSTER
}

/// Base provider config for one model, with optional tier overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub region: Option<String>,
    pub model_config: ModelConfig,
    pub error_handling_config: ErrorHandlingConfig,
    pub credentials: ApiKeyCredentials,
    #[serde(default)]
    pub query: Option<WorkloadOverrides>,
    #[serde(default)]
    pub change_stream: Option<WorkloadOverrides>,
    #[serde(default)]
    pub collection_scan: Option<WorkloadOverrides>,
    #[serde(default)]
    pub tenant_credentials: Option<BTreeMap<String, TenantWorkloadCredentials>>,
    #[serde(default = "default_dedicated")]
    pub is_dedicated_cluster: bool,
    #[serde(default)]
    pub provider_endpoint: Option<String>,
}

impl EmbeddingConfig {
    /// A dedicated-cluster config with no overrides.
    pub fn new(
        model_config: ModelConfig,
        error_handling_config: ErrorHandlingConfig,
        credentials: ApiKeyCredentials,
    ) -> Self {
        Self {
            region: None,
            model_config,
            error_handling_config,
            credentials,
            query: None,
            change_stream: None,
            collection_scan: None,
            tenant_credentials: None,
            is_dedicated_cluster: defaults::DEFAULT_IS_DEDICATED_CLUSTER,
            provider_endpoint: None,
        }
    }

    pub fn overrides_for(&self, tier: ServiceTier) -> Option<&WorkloadOverrides> {
        match tier {
            ServiceTier::Query => self.query.as_ref(),
            ServiceTier::ChangeStream => self.change_stream.as_ref(),
            ServiceTier::CollectionScan => self.collection_scan.as_ref(),
        }
    }

    /// Copy with every credential replaced by `placeholder`, safe to log.
    pub fn copy_sanitized(&self, placeholder: &str) -> Self {
        Self {
            region: self.region.clone(),
            model_config: self.model_config.clone(),
            error_handling_config: self.error_handling_config.clone(),
            credentials: self.credentials.copy_sanitized(placeholder),
            query: self.query.as_ref().map(|o| o.copy_sanitized(placeholder)),
            change_stream: self
                .change_stream
                .as_ref()
                .map(|o| o.copy_sanitized(placeholder)),
            collection_scan: self
                .collection_scan
                .as_ref()
                .map(|o| o.copy_sanitized(placeholder)),
            tenant_credentials: self.tenant_credentials.as_ref().map(|map| {
                map.iter()
                    .map(|(tenant, creds)| (tenant.clone(), creds.copy_sanitized(placeholder)))
                    .collect()
            }),
            is_dedicated_cluster: self.is_dedicated_cluster,
            provider_endpoint: self.provider_endpoint.clone(),
        }
    }
}

/// One entry of the desired configuration list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingServiceConfig {
    pub embedding_provider: EmbeddingProvider,
    pub model_name: String,
    pub config: EmbeddingConfig,
    /// Models a query may name instead of the one the index was built with.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub compatible_models: BTreeSet<String>,
}

impl EmbeddingServiceConfig {
    pub fn new(
        embedding_provider: EmbeddingProvider,
        model_name: impl Into<String>,
        config: EmbeddingConfig,
    ) -> Self {
        Self {
            embedding_provider,
            model_name: model_name.into(),
            config,
            compatible_models: BTreeSet::new(),
        }
    }

    pub fn with_compatible_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compatible_models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_compatible_with(&self, model: &str) -> bool {
        self.model_name.eq_ignore_ascii_case(model) || self.compatible_models.contains(model)
    }

    pub fn copy_sanitized(&self, placeholder: &str) -> Self {
        Self {
            embedding_provider: self.embedding_provider,
            model_name: self.model_name.clone(),
            config: self.config.copy_sanitized(placeholder),
            compatible_models: self.compatible_models.clone(),
        }
    }
}

/// The complete desired configuration, as loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfigSet {
    #[serde(default)]
    pub models: Vec<EmbeddingServiceConfig>,
}

impl ServiceConfigSet {
    pub fn from_toml(input: &str) -> EmbeddingResult<Self> {
        toml::from_str(input).map_err(|e| EmbeddingError::invalid_config(e.to_string()))
    }

    pub fn to_toml(&self) -> EmbeddingResult<String> {
        toml::to_string(self).map_err(|e| EmbeddingError::invalid_config(e.to_string()))
    }
}
