#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use embedgate_core::config::{
    ApiKeyCredentials, EmbeddingConfig, ErrorHandlingConfig, ModelConfig,
};
use embedgate_core::{
    CanonicalModelConfig, ClientFactory, EmbeddingError, EmbeddingProvider, EmbeddingResult,
    EmbeddingServiceConfig, MetricTags, ProviderClient, RequestContext, ServiceTier,
    VectorOrError, WorkloadParams,
};
use embedgate_dispatch::{EmbeddingServiceManager, ServiceRegistry, TaskScheduler};
use embedgate_observability::InMemoryMetrics;

pub const MODEL: &str = "voyage-3-large";

pub type Behavior = Arc<dyn Fn(&[String]) -> EmbeddingResult<Vec<VectorOrError>> + Send + Sync>;

/// One vector per text, holding the text's length.
pub fn length_vectors(texts: &[String]) -> Vec<VectorOrError> {
    texts
        .iter()
        .map(|t| VectorOrError::Vector(vec![t.len() as f32]))
        .collect()
}

/// Wrap a closure as a `Behavior`.
pub fn behavior<F>(f: F) -> Behavior
where
    F: Fn(&[String]) -> EmbeddingResult<Vec<VectorOrError>> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn ok_behavior() -> Behavior {
    behavior(|texts| Ok(length_vectors(texts)))
}

/// Scripted client that counts calls and applied config updates.
pub struct FakeClient {
    behavior: Behavior,
    pub calls: AtomicUsize,
    pub updates: Arc<AtomicUsize>,
    /// Outcomes for upcoming updates across all clients; `false` rejects.
    /// Updates are accepted once it is empty.
    pub update_script: Arc<Mutex<VecDeque<bool>>>,
    /// Batch size of the last config this client accepted.
    pub batch_size: AtomicUsize,
}

impl ProviderClient for FakeClient {
    fn embed(
        &self,
        texts: &[String],
        _ctx: &RequestContext,
    ) -> EmbeddingResult<Vec<VectorOrError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.behavior)(texts)
    }

    fn update_config(&self, params: &WorkloadParams) -> EmbeddingResult<()> {
        let accepted = self.update_script.lock().unwrap().pop_front().unwrap_or(true);
        if !accepted {
            return Err(EmbeddingError::transient("update rejected"));
        }
        self.batch_size
            .store(params.model_config.batch_size(), Ordering::SeqCst);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory handing out `FakeClient`s that all share one behavior.
pub struct FakeFactory {
    behavior: Behavior,
    pub creates: AtomicUsize,
    pub updates: Arc<AtomicUsize>,
    pub update_script: Arc<Mutex<VecDeque<bool>>>,
    pub clients: Mutex<Vec<Arc<FakeClient>>>,
}

impl FakeFactory {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            creates: AtomicUsize::new(0),
            updates: Arc::new(AtomicUsize::new(0)),
            update_script: Arc::new(Mutex::new(VecDeque::new())),
            clients: Mutex::new(Vec::new()),
        })
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// The next `n` client config updates fail with a transient error.
    pub fn fail_next_updates(&self, n: usize) {
        let mut script = self.update_script.lock().unwrap();
        script.clear();
        script.extend(std::iter::repeat(false).take(n));
    }

    /// Accept the next `n` client config updates, then reject one.
    pub fn fail_update_after(&self, n: usize) {
        let mut script = self.update_script.lock().unwrap();
        script.clear();
        script.extend(std::iter::repeat(true).take(n));
        script.push_back(false);
    }

    /// Batch size each client last accepted, in creation order.
    pub fn applied_batch_sizes(&self) -> Vec<usize> {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.batch_size.load(Ordering::SeqCst))
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.calls.load(Ordering::SeqCst))
            .sum()
    }
}

impl ClientFactory for FakeFactory {
    fn create_client(
        &self,
        _model: &CanonicalModelConfig,
        _tier: ServiceTier,
        params: &WorkloadParams,
    ) -> EmbeddingResult<Arc<dyn ProviderClient>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let client = Arc::new(FakeClient {
            behavior: Arc::clone(&self.behavior),
            calls: AtomicUsize::new(0),
            updates: Arc::clone(&self.updates),
            update_script: Arc::clone(&self.update_script),
            batch_size: AtomicUsize::new(params.model_config.batch_size()),
        });
        self.clients.lock().unwrap().push(Arc::clone(&client));
        Ok(client)
    }
}

pub fn embedding_config(
    batch_size: usize,
    batch_token_limit: u32,
    error_handling: ErrorHandlingConfig,
) -> EmbeddingConfig {
    EmbeddingConfig::new(
        ModelConfig {
            output_dimensions: Some(1024),
            truncation: None,
            batch_size: Some(batch_size),
            batch_token_limit: Some(batch_token_limit),
        },
        error_handling,
        ApiKeyCredentials::new("token123"),
    )
}

pub fn service_config(config: EmbeddingConfig) -> EmbeddingServiceConfig {
    EmbeddingServiceConfig::new(EmbeddingProvider::Voyage, MODEL, config)
}

pub fn canonical(config: &EmbeddingServiceConfig) -> CanonicalModelConfig {
    CanonicalModelConfig::create(&config.model_name, config.embedding_provider, &config.config)
}

pub fn tags(tier: ServiceTier) -> MetricTags {
    MetricTags::new("VOYAGE", MODEL, tier)
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn ctx() -> RequestContext {
    RequestContext::new("testdb")
}

pub struct Harness {
    pub service: EmbeddingServiceManager,
    pub registry: Arc<ServiceRegistry>,
    pub factory: Arc<FakeFactory>,
    pub metrics: Arc<InMemoryMetrics>,
    pub model: CanonicalModelConfig,
}

impl Harness {
    /// Must be called inside a tokio runtime.
    pub fn new(config: EmbeddingServiceConfig, behavior: Behavior) -> Self {
        let scheduler = TaskScheduler::try_current("embedding-test").unwrap();
        Self::with_scheduler(config, behavior, scheduler)
    }

    pub fn with_scheduler(
        config: EmbeddingServiceConfig,
        behavior: Behavior,
        scheduler: TaskScheduler,
    ) -> Self {
        let registry = Arc::new(ServiceRegistry::new());
        let factory = FakeFactory::new(behavior);
        let metrics = Arc::new(InMemoryMetrics::new());
        let model = canonical(&config);
        let service = EmbeddingServiceManager::new(
            &[config],
            Arc::clone(&registry),
            factory.clone(),
            scheduler,
            metrics.clone(),
        )
        .unwrap();
        Self {
            service,
            registry,
            factory,
            metrics,
            model,
        }
    }
}
