//! Per-tier clients, shared rate limiters and the retrying async path for
//! one canonical model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use embedgate_core::config::defaults::DEFAULT_RPS_PER_PROVIDER;
use embedgate_core::{
    CanonicalModelConfig, ClientFactory, EmbeddingError, EmbeddingProvider, EmbeddingResult,
    MetricsRecorder, ProviderClient, RequestContext, ServiceTier, VectorOrError,
};
use tracing::{debug, info, warn};

use crate::metrics::TierMetrics;
use crate::rate_limit::ClientRateLimiter;
use crate::retry::RetryPolicy;
use crate::scheduler::{flatten_join, EmbedTask, TaskScheduler};

// Writers only swap whole values, so a poisoned lock still holds a
// consistent value.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One value per service tier.
#[derive(Debug, Clone)]
struct PerTier<T> {
    query: T,
    change_stream: T,
    collection_scan: T,
}

impl<T> PerTier<T> {
    fn build(mut f: impl FnMut(ServiceTier) -> T) -> Self {
        Self {
            query: f(ServiceTier::Query),
            change_stream: f(ServiceTier::ChangeStream),
            collection_scan: f(ServiceTier::CollectionScan),
        }
    }

    fn get(&self, tier: ServiceTier) -> &T {
        match tier {
            ServiceTier::Query => &self.query,
            ServiceTier::ChangeStream => &self.change_stream,
            ServiceTier::CollectionScan => &self.collection_scan,
        }
    }
}

/// Owns the provider clients of one canonical model, one per tier.
///
/// Rate limiters are keyed by credential id, so tiers that share
/// credentials share a limiter.
pub struct ProviderManager {
    name: String,
    provider: EmbeddingProvider,
    config: RwLock<Arc<CanonicalModelConfig>>,
    clients: RwLock<HashMap<ServiceTier, Arc<dyn ProviderClient>>>,
    rate_limiters: RwLock<HashMap<String, Arc<ClientRateLimiter>>>,
    metrics: PerTier<TierMetrics>,
    factory: Arc<dyn ClientFactory>,
    scheduler: TaskScheduler,
    update_lock: Mutex<()>,
}

impl ProviderManager {
    /// Create a manager and one client per tier.
    pub fn new(
        config: CanonicalModelConfig,
        factory: Arc<dyn ClientFactory>,
        scheduler: TaskScheduler,
        recorder: Arc<dyn MetricsRecorder>,
    ) -> EmbeddingResult<Self> {
        let metrics = PerTier::build(|tier| {
            TierMetrics::new(Arc::clone(&recorder), config.provider, &config.name, tier)
        });

        let mut rate_limiters = HashMap::new();
        let mut clients: HashMap<ServiceTier, Arc<dyn ProviderClient>> = HashMap::new();
        for tier in ServiceTier::ALL {
            let params = config.workload(tier);
            rate_limiters
                .entry(params.credentials.credentials_id())
                .or_insert_with(|| Arc::new(ClientRateLimiter::per_second(DEFAULT_RPS_PER_PROVIDER)));
            clients.insert(tier, factory.create_client(&config, tier, params)?);
        }

        info!(
            model = %config.name,
            provider = %config.provider,
            rate_limiters = rate_limiters.len(),
            "provider manager created"
        );

        Ok(Self {
            name: config.name.clone(),
            provider: config.provider,
            config: RwLock::new(Arc::new(config)),
            clients: RwLock::new(clients),
            rate_limiters: RwLock::new(rate_limiters),
            metrics,
            factory,
            scheduler,
            update_lock: Mutex::new(()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    /// Current config snapshot.
    pub fn config(&self) -> Arc<CanonicalModelConfig> {
        Arc::clone(&read(&self.config))
    }

    /// Number of distinct rate limiters (one per credential id seen).
    pub fn rate_limiter_count(&self) -> usize {
        read(&self.rate_limiters).len()
    }

    fn client(&self, tier: ServiceTier) -> EmbeddingResult<Arc<dyn ProviderClient>> {
        read(&self.clients).get(&tier).cloned().ok_or_else(|| {
            EmbeddingError::non_transient(format!("no {tier} client for model {}", self.name))
        })
    }

    fn rate_limiter(&self, credentials_id: &str) -> Option<Arc<ClientRateLimiter>> {
        read(&self.rate_limiters).get(credentials_id).cloned()
    }

    /// Apply a new config. Structurally equal configs are a no-op.
    ///
    /// Missing clients are built and every existing client is updated before
    /// anything is committed. If a client rejects the update, clients already
    /// updated are put back on the previous config and the manager keeps it,
    /// so retrying the same reload reaches the clients again. On success,
    /// rate limiters are added for new credentials and the config is swapped.
    pub fn update_config(&self, new_config: CanonicalModelConfig) -> EmbeddingResult<()> {
        let _guard = self
            .update_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous = self.config();
        if *previous == new_config {
            debug!(model = %self.name, "config unchanged, skipping provider manager refresh");
            return Ok(());
        }
        info!(
            model = %new_config.name,
            provider = %new_config.provider,
            "updating provider manager with new config"
        );

        let current = read(&self.clients).clone();
        let mut created: Vec<(ServiceTier, Arc<dyn ProviderClient>)> = Vec::new();
        for tier in ServiceTier::ALL {
            if !current.contains_key(&tier) {
                let client = self
                    .factory
                    .create_client(&new_config, tier, new_config.workload(tier))?;
                created.push((tier, client));
            }
        }

        let mut applied: Vec<(ServiceTier, &Arc<dyn ProviderClient>)> = Vec::new();
        for tier in ServiceTier::ALL {
            let Some(client) = current.get(&tier) else {
                continue;
            };
            if let Err(e) = client.update_config(new_config.workload(tier)) {
                warn!(
                    model = %self.name,
                    tier = %tier,
                    error = %e,
                    "client rejected config update, keeping previous config"
                );
                self.restore_clients(&applied, &previous);
                return Err(e);
            }
            applied.push((tier, client));
        }

        {
            let mut limiters = write(&self.rate_limiters);
            for tier in ServiceTier::ALL {
                limiters
                    .entry(new_config.workload(tier).credentials.credentials_id())
                    .or_insert_with(|| {
                        Arc::new(ClientRateLimiter::per_second(DEFAULT_RPS_PER_PROVIDER))
                    });
            }
        }
        write(&self.clients).extend(created);
        *write(&self.config) = Arc::new(new_config);
        Ok(())
    }

    fn restore_clients(
        &self,
        applied: &[(ServiceTier, &Arc<dyn ProviderClient>)],
        previous: &CanonicalModelConfig,
    ) {
        for (tier, client) in applied {
            if let Err(e) = client.update_config(previous.workload(*tier)) {
                warn!(
                    model = %self.name,
                    tier = %tier,
                    error = %e,
                    "failed to restore previous client config"
                );
            }
        }
    }

    /// Synchronous call without retry or rate limiting, for latency-sensitive
    /// query traffic. The client's error is returned unchanged.
    pub fn embed(
        &self,
        texts: &[String],
        tier: ServiceTier,
        ctx: &RequestContext,
    ) -> EmbeddingResult<Vec<VectorOrError>> {
        let metrics = self.metrics.get(tier);
        metrics.batch_size(texts.len());

        let start = Instant::now();
        let result = self.client(tier).and_then(|client| client.embed(texts, ctx));
        metrics.latency(start.elapsed());

        match &result {
            Ok(_) => metrics.success(),
            Err(e) => {
                debug!(model = %self.name, tier = %tier, error = %e, "sync embed failed");
                metrics.failure();
            }
        }
        result
    }

    /// Rate-limited, retried call on the scheduler.
    pub fn embed_async(
        self: &Arc<Self>,
        texts: Vec<String>,
        tier: ServiceTier,
        ctx: RequestContext,
    ) -> EmbedTask {
        let manager = Arc::clone(self);
        let handle = self
            .scheduler
            .spawn(async move { manager.embed_with_retry(texts, tier, ctx).await });
        EmbedTask::spawned(handle)
    }

    async fn embed_with_retry(
        &self,
        texts: Vec<String>,
        tier: ServiceTier,
        ctx: RequestContext,
    ) -> EmbeddingResult<Vec<VectorOrError>> {
        // Built per request so updated error handling applies to new calls.
        let policy = RetryPolicy::from_config(&self.config().workload(tier).error_handling);
        let metrics = self.metrics.get(tier);
        let texts = Arc::new(texts);
        let ctx = Arc::new(ctx);

        let outcome = policy
            .run(
                || self.attempt(Arc::clone(&texts), tier, Arc::clone(&ctx)),
                |attempt, error| {
                    metrics.retried();
                    warn!(
                        model = %self.name,
                        tier = %tier,
                        attempt,
                        error = %error,
                        "embedding call failed, retrying"
                    );
                },
            )
            .await;

        metrics.attempts(outcome.attempts);
        match &outcome.result {
            Ok(_) => metrics.success(),
            Err(e) => {
                debug!(
                    model = %self.name,
                    tier = %tier,
                    attempts = outcome.attempts,
                    error = %e,
                    "embedding call failed"
                );
                metrics.failure();
            }
        }
        outcome.result
    }

    async fn attempt(
        &self,
        texts: Arc<Vec<String>>,
        tier: ServiceTier,
        ctx: Arc<RequestContext>,
    ) -> EmbeddingResult<Vec<VectorOrError>> {
        let credentials_id = self.config().workload(tier).credentials.credentials_id();
        if let Some(limiter) = self.rate_limiter(&credentials_id) {
            if let Err(e) = limiter.acquire_or_reject() {
                warn!(
                    model = %self.name,
                    tier = %tier,
                    rps = limiter.requests_per_second(),
                    "client-side rate limit exceeded"
                );
                return Err(e);
            }
        }

        let client = self.client(tier)?;
        let metrics = self.metrics.get(tier);
        metrics.batch_size(texts.len());

        let start = Instant::now();
        let joined = self
            .scheduler
            .spawn_blocking(move || client.embed(&texts, &ctx))
            .await;
        metrics.latency(start.elapsed());
        flatten_join(joined)
    }
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderManager")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
