//! Public entry point for embedding requests: batching, dispatch,
//! rebatch recovery and ordered merge.

use std::sync::Arc;

use embedgate_core::config::defaults::{DEFAULT_AVG_CHARS_PER_TOKEN, FALLBACK_AVG_CHARS_PER_TOKEN};
use embedgate_core::{
    CanonicalModelConfig, ClientFactory, EmbeddingError, EmbeddingResult, EmbeddingServiceConfig,
    MetricsRecorder, RequestContext, ServiceTier, VectorOrError,
};
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::batching::generate_batches;
use crate::metrics::{GlobalCounter, TOKEN_ESTIMATION_FAILS};
use crate::provider_manager::ProviderManager;
use crate::registry::{ManagerDeps, ServiceRegistry};
use crate::scheduler::{EmbedTask, TaskScheduler};

/// Everything a batch needs to re-split and re-dispatch itself.
struct DispatchContext {
    manager: Arc<ProviderManager>,
    tier: ServiceTier,
    ctx: RequestContext,
    batch_size: usize,
    batch_token_limit: f64,
    token_estimation_fails: GlobalCounter,
}

impl DispatchContext {
    fn dispatch(&self, inputs: Vec<String>) -> EmbedTask {
        self.manager.embed_async(inputs, self.tier, self.ctx.clone())
    }
}

/// Lifecycle of one batch produced by the initial split.
///
/// `Dispatched` → `Done`, or `Dispatched` → `Rebatching` → `Done` when the
/// provider rejects the batch as too large. Rebatching happens at most once.
enum BatchState {
    Dispatched {
        inputs: Vec<String>,
        task: EmbedTask,
    },
    Rebatching {
        tasks: Vec<EmbedTask>,
    },
    Done(EmbeddingResult<Vec<VectorOrError>>),
}

impl BatchState {
    fn dispatch(dc: &DispatchContext, inputs: Vec<String>) -> Self {
        let task = dc.dispatch(inputs.clone());
        Self::Dispatched { inputs, task }
    }

    async fn advance(self, dc: &DispatchContext) -> Self {
        match self {
            Self::Dispatched { inputs, task } => match task.await {
                Err(e) if e.is_batch_too_large() => {
                    let sub_batches = generate_batches(
                        &inputs,
                        dc.batch_size,
                        dc.batch_token_limit,
                        FALLBACK_AVG_CHARS_PER_TOKEN,
                    );
                    debug!(
                        model = %dc.manager.name(),
                        tier = %dc.tier,
                        texts = inputs.len(),
                        sub_batches = sub_batches.len(),
                        "batch rejected as too large, rebatching"
                    );
                    Self::Rebatching {
                        tasks: sub_batches.into_iter().map(|b| dc.dispatch(b)).collect(),
                    }
                }
                result => Self::Done(result),
            },
            Self::Rebatching { tasks } => Self::Done(match try_join_all(tasks).await {
                Ok(parts) => Ok(parts.into_iter().flatten().collect()),
                Err(EmbeddingError::BatchTooLarge { reason }) => {
                    dc.token_estimation_fails.increment();
                    warn!(
                        model = %dc.manager.name(),
                        tier = %dc.tier,
                        reason = %reason,
                        "rebatched request still too large"
                    );
                    Err(EmbeddingError::non_transient(reason))
                }
                Err(e) => Err(e),
            }),
            done @ Self::Done(_) => done,
        }
    }

    async fn complete(mut self, dc: &DispatchContext) -> EmbeddingResult<Vec<VectorOrError>> {
        loop {
            match self {
                Self::Done(result) => return result,
                state => self = state.advance(dc).await,
            }
        }
    }
}

/// Entry point for embedding requests.
///
/// Owns the registry wiring; provider managers are looked up by the
/// canonical model name of each request.
pub struct EmbeddingServiceManager {
    registry: Arc<ServiceRegistry>,
    deps: ManagerDeps,
    token_estimation_fails: GlobalCounter,
}

impl EmbeddingServiceManager {
    /// Create a manager and register `configs`.
    pub fn new(
        configs: &[EmbeddingServiceConfig],
        registry: Arc<ServiceRegistry>,
        factory: Arc<dyn ClientFactory>,
        scheduler: TaskScheduler,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> EmbeddingResult<Self> {
        let manager = Self {
            registry,
            token_estimation_fails: GlobalCounter::new(Arc::clone(&metrics), TOKEN_ESTIMATION_FAILS),
            deps: ManagerDeps {
                factory,
                scheduler,
                metrics,
            },
        };
        manager.update_embedding_provider_managers(configs)?;
        Ok(manager)
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Reconcile registered models with the latest desired configuration.
    pub fn update_embedding_provider_managers(
        &self,
        configs: &[EmbeddingServiceConfig],
    ) -> EmbeddingResult<()> {
        self.registry.update_registered_providers(configs, &self.deps)
    }

    /// Embed query texts in a single call, without batching or retry.
    ///
    /// # Panics
    ///
    /// Panics if `tier` is not `ServiceTier::Query`.
    pub fn embed(
        &self,
        inputs: &[String],
        model: &CanonicalModelConfig,
        tier: ServiceTier,
        ctx: &RequestContext,
    ) -> EmbeddingResult<Vec<VectorOrError>> {
        assert!(
            tier == ServiceTier::Query,
            "sync embed is only supported for the QUERY tier, got {tier}"
        );
        self.registry
            .get_provider_manager(&model.name)?
            .embed(inputs, tier, ctx)
    }

    /// Batch, dispatch, and merge. The result has one entry per input, in
    /// input order; any batch that fails for good fails the whole task.
    pub fn embed_async(
        &self,
        inputs: Vec<String>,
        model: &CanonicalModelConfig,
        tier: ServiceTier,
        ctx: RequestContext,
    ) -> EmbedTask {
        let manager = match self.registry.get_provider_manager(&model.name) {
            Ok(manager) => manager,
            Err(e) => return EmbedTask::failed(e),
        };

        let model_config = &model.workload(tier).model_config;
        let dc = DispatchContext {
            manager,
            tier,
            ctx,
            batch_size: model_config.batch_size(),
            batch_token_limit: f64::from(model_config.batch_token_limit()),
            token_estimation_fails: self.token_estimation_fails.clone(),
        };

        // Every batch is in flight before the merge starts waiting.
        let states: Vec<BatchState> = generate_batches(
            &inputs,
            dc.batch_size,
            dc.batch_token_limit,
            DEFAULT_AVG_CHARS_PER_TOKEN,
        )
        .into_iter()
        .map(|batch| BatchState::dispatch(&dc, batch))
        .collect();

        debug!(
            model = %model.name,
            tier = %tier,
            texts = inputs.len(),
            batches = states.len(),
            "dispatched embedding batches"
        );

        let handle = self.deps.scheduler.spawn(async move {
            try_join_all(states.into_iter().map(|s| s.complete(&dc)))
                .await
                .map(|parts| parts.into_iter().flatten().collect::<Vec<VectorOrError>>())
        });
        EmbedTask::spawned(handle)
    }
}

impl std::fmt::Debug for EmbeddingServiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingServiceManager")
            .field("registry", &self.registry)
            .field("scheduler", &self.deps.scheduler)
            .finish()
    }
}
