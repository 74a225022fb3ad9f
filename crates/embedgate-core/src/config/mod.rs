pub mod defaults;

mod credentials;
mod model_config;
mod service_config;
mod tier;

pub use credentials::{ApiKeyCredentials, TenantWorkloadCredentials};
pub use model_config::{CanonicalModelConfig, WorkloadParams};
pub use service_config::{
    EmbeddingConfig, EmbeddingServiceConfig, ErrorHandlingConfig, ModelConfig, ServiceConfigSet,
    TruncationOption, WorkloadOverrides,
};
pub use tier::{EmbeddingProvider, ServiceTier};
