//! Voyage AI embeddings client.
//!
//! One client per model and tier. Requests are blocking; the provider
//! manager runs them on the scheduler's blocking pool.

use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock, RwLock};
use std::time::Duration;

use embedgate_core::{
    CanonicalModelConfig, EmbeddingError, EmbeddingResult, ProviderClient, RequestContext,
    ServiceTier, VectorOrError, WorkloadParams,
};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, warn};

use super::voyage_schema::{EmbedRequest, EmbedResponse};
use crate::metrics::TierMetrics;

pub const DEFAULT_ENDPOINT: &str = "https://api.voyageai.com/v1/embeddings";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const BATCH_TOO_LARGE_MARKER: &str = "Please lower the number of tokens in the batch";

static BEARER_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"Bearer [^"\s]+"#).ok());

/// Replace bearer tokens in `message` with a placeholder.
pub fn redact_api_key(message: &str) -> String {
    match BEARER_TOKEN.as_ref() {
        Some(re) => re
            .replace_all(message, "Bearer <REDACTED-API-KEY>")
            .into_owned(),
        None => message.to_string(),
    }
}

/// Endpoint and credentials, replaced as a whole on `update_config`.
#[derive(Debug, Clone, Default)]
struct ClientState {
    endpoint: String,
    is_dedicated_cluster: bool,
    /// Dedicated-cluster token.
    token: Option<String>,
    /// Multi-tenant tokens for this tier, by tenant id.
    tenant_tokens: HashMap<String, String>,
}

impl ClientState {
    fn from_params(params: &WorkloadParams, tier: ServiceTier) -> Self {
        let endpoint = params
            .provider_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        if params.is_dedicated_cluster {
            let creds = params
                .tenant_credentials
                .as_ref()
                .unwrap_or(&params.credentials);
            return Self {
                endpoint,
                is_dedicated_cluster: true,
                token: Some(creds.api_token.clone()),
                tenant_tokens: HashMap::new(),
            };
        }

        let mut tenant_tokens = HashMap::new();
        match &params.per_tenant_credentials {
            Some(per_tenant) => {
                for (tenant, creds) in per_tenant {
                    match creds.for_tier(tier) {
                        Some(c) => {
                            tenant_tokens.insert(tenant.clone(), c.api_token.clone());
                        }
                        None => warn!(tenant = %tenant, tier = %tier, "no credentials for tenant and tier"),
                    }
                }
            }
            None => warn!(tier = %tier, "multi-tenant cluster config has no per-tenant credentials"),
        }
        debug!(tier = %tier, tenants = tenant_tokens.len(), "configured tenant credentials");
        Self {
            endpoint,
            is_dedicated_cluster: false,
            token: None,
            tenant_tokens,
        }
    }

    fn select_token(&self, ctx: &RequestContext) -> EmbeddingResult<String> {
        if self.is_dedicated_cluster {
            return self.token.clone().ok_or_else(|| {
                EmbeddingError::non_transient("Dedicated cluster credentials not configured.")
            });
        }
        let tenant = ctx.tenant_id().ok_or_else(|| {
            EmbeddingError::transient(
                "Unable to extract tenant ID from database name for MTM cluster. \
                 Database name must be in format 'tenantId_dbName'.",
            )
        })?;
        self.tenant_tokens.get(tenant).cloned().ok_or_else(|| {
            EmbeddingError::transient(format!("Unable to find credentials for tenant: {tenant}"))
        })
    }
}

pub struct VoyageClient {
    model_id: String,
    tier: ServiceTier,
    input_type: &'static str,
    truncation: bool,
    state: RwLock<ClientState>,
    http: OnceLock<Client>,
    metrics: TierMetrics,
}

impl VoyageClient {
    pub fn new(
        model: &CanonicalModelConfig,
        tier: ServiceTier,
        params: &WorkloadParams,
        metrics: TierMetrics,
    ) -> Self {
        let is_query = tier == ServiceTier::Query;
        Self {
            model_id: model.name.clone(),
            tier,
            input_type: if is_query { "query" } else { "document" },
            // Truncate at indexing time only.
            truncation: !is_query,
            state: RwLock::new(ClientState::from_params(params, tier)),
            http: OnceLock::new(),
            metrics,
        }
    }

    pub fn endpoint(&self) -> String {
        self.state().endpoint
    }

    fn state(&self) -> ClientState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // Built on first use so construction never happens inside an async
    // context.
    fn http(&self) -> EmbeddingResult<&Client> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| EmbeddingError::transient(redact_api_key(&e.to_string())))?;
        let _ = self.http.set(client);
        self.http
            .get()
            .ok_or_else(|| EmbeddingError::transient("voyage http client unavailable"))
    }

    fn map_response(
        &self,
        status: u16,
        body: &str,
        inputs: &[String],
    ) -> EmbeddingResult<Vec<VectorOrError>> {
        if status == 400 {
            let message = format!(
                "Got invalid request, fail fast and give up retries. Response body: {body}."
            );
            if body.contains(BATCH_TOO_LARGE_MARKER) {
                return Err(EmbeddingError::batch_too_large(message));
            }
            warn!(model = %self.model_id, tier = %self.tier, "{message}");
            self.metrics.invalid_request();
            return Ok(inputs
                .iter()
                .map(|_| VectorOrError::Error(message.clone()))
                .collect());
        }
        if status > 400 {
            return Err(EmbeddingError::transient(format!(
                "Got non OK status from response, status code: {status}"
            )));
        }

        let mut response: EmbedResponse = serde_json::from_str(body).map_err(|e| {
            EmbeddingError::transient(format!("Failed to parse voyage response: {e}"))
        })?;
        self.metrics.input_tokens(response.usage.total_tokens);
        response.data.sort_by_key(|v| v.index);

        let expected = inputs.iter().filter(|t| !t.is_empty()).count();
        if response.data.len() != expected {
            return Err(EmbeddingError::transient(format!(
                "Voyage returned {} embeddings for {expected} inputs",
                response.data.len()
            )));
        }

        let mut vectors = response.data.iter();
        inputs
            .iter()
            .map(|input| {
                if input.is_empty() {
                    return Ok(VectorOrError::empty_input());
                }
                match vectors.next() {
                    Some(v) => v
                        .decode()
                        .map(VectorOrError::Vector)
                        .map_err(EmbeddingError::transient),
                    None => Err(EmbeddingError::transient("missing embedding in response")),
                }
            })
            .collect()
    }
}

impl ProviderClient for VoyageClient {
    fn embed(
        &self,
        texts: &[String],
        ctx: &RequestContext,
    ) -> EmbeddingResult<Vec<VectorOrError>> {
        // Voyage rejects empty strings, so they never leave the process.
        let filtered: Vec<String> = texts.iter().filter(|t| !t.is_empty()).cloned().collect();
        if filtered.is_empty() {
            return Ok(texts.iter().map(|_| VectorOrError::empty_input()).collect());
        }

        let state = self.state();
        let token = state.select_token(ctx)?;
        let request = EmbedRequest::new(&self.model_id, self.input_type, filtered, self.truncation);

        let response = self
            .http()?
            .post(&state.endpoint)
            .bearer_auth(&token)
            .header(
                USER_AGENT,
                concat!("embedgate/", env!("CARGO_PKG_VERSION")),
            )
            .json(&request)
            .send()
            .map_err(|e| {
                let message = redact_api_key(&e.to_string());
                warn!(model = %self.model_id, tier = %self.tier, error = %message, "voyage request failed");
                EmbeddingError::transient(message)
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            EmbeddingError::transient(redact_api_key(&format!(
                "Failed to read voyage response: {e}"
            )))
        })?;
        debug!(
            model = %self.model_id,
            tier = %self.tier,
            status,
            texts = texts.len(),
            request_id = %ctx.request_id,
            "voyage response received"
        );
        self.map_response(status, &body, texts)
    }

    fn update_config(&self, params: &WorkloadParams) -> EmbeddingResult<()> {
        let next = ClientState::from_params(params, self.tier);
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
        Ok(())
    }
}

impl std::fmt::Debug for VoyageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoyageClient")
            .field("model_id", &self.model_id)
            .field("tier", &self.tier)
            .field("endpoint", &self.endpoint())
            .finish()
    }
}
