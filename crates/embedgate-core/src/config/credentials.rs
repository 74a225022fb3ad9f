use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::tier::ServiceTier;

/// Bearer-token credentials for a provider API.
///
/// Two credentials are equal when their tokens match; the expiration date is
/// informational only and never forces a client update.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCredentials {
    pub api_token: String,
    #[serde(default)]
    pub expiration_date: String,
}

impl ApiKeyCredentials {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            expiration_date: String::new(),
        }
    }

    pub fn with_expiration(mut self, expiration_date: impl Into<String>) -> Self {
        self.expiration_date = expiration_date.into();
        self
    }

    /// Stable identity key for these credentials. Rate limiters are shared by
    /// every tier whose credentials produce the same id.
    pub fn credentials_id(&self) -> String {
        blake3::hash(self.api_token.as_bytes()).to_hex().to_string()
    }

    pub fn copy_sanitized(&self, placeholder: &str) -> Self {
        Self {
            api_token: placeholder.to_string(),
            expiration_date: self.expiration_date.clone(),
        }
    }
}

impl PartialEq for ApiKeyCredentials {
    fn eq(&self, other: &Self) -> bool {
        self.api_token == other.api_token
    }
}

impl Eq for ApiKeyCredentials {}

impl Hash for ApiKeyCredentials {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.api_token.hash(state);
    }
}

impl fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("api_token", &"<redacted>")
            .field("expiration_date", &self.expiration_date)
            .finish()
    }
}

/// Per-tier credentials for one tenant of a multi-tenant cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantWorkloadCredentials {
    #[serde(default)]
    pub query: Option<ApiKeyCredentials>,
    #[serde(default)]
    pub change_stream: Option<ApiKeyCredentials>,
    #[serde(default)]
    pub collection_scan: Option<ApiKeyCredentials>,
}

impl TenantWorkloadCredentials {
    pub fn for_tier(&self, tier: ServiceTier) -> Option<&ApiKeyCredentials> {
        match tier {
            ServiceTier::Query => self.query.as_ref(),
            ServiceTier::ChangeStream => self.change_stream.as_ref(),
            ServiceTier::CollectionScan => self.collection_scan.as_ref(),
        }
    }

    pub fn copy_sanitized(&self, placeholder: &str) -> Self {
        Self {
            query: self.query.as_ref().map(|c| c.copy_sanitized(placeholder)),
            change_stream: self
                .change_stream
                .as_ref()
                .map(|c| c.copy_sanitized(placeholder)),
            collection_scan: self
                .collection_scan
                .as_ref()
                .map(|c| c.copy_sanitized(placeholder)),
        }
    }
}
