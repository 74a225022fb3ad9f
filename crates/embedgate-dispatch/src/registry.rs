//! Concurrent lookup from canonical model name to its `ProviderManager`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use embedgate_core::{
    CanonicalModelConfig, ClientFactory, EmbeddingError, EmbeddingResult, EmbeddingServiceConfig,
    MetricsRecorder,
};
use tracing::{debug, info, warn};

use crate::provider_manager::ProviderManager;
use crate::scheduler::TaskScheduler;

/// What a newly created `ProviderManager` is wired with.
#[derive(Clone)]
pub struct ManagerDeps {
    pub factory: Arc<dyn ClientFactory>,
    pub scheduler: TaskScheduler,
    pub metrics: Arc<dyn MetricsRecorder>,
}

/// Holds exactly one `ProviderManager` per canonical model name.
///
/// Names are matched case-insensitively. Lookups never wait on a reload;
/// reloads are serialized with each other.
#[derive(Default)]
pub struct ServiceRegistry {
    managers: DashMap<String, Arc<ProviderManager>>,
    reload_lock: Mutex<()>,
}

fn registry_key(name: &str) -> String {
    name.to_lowercase()
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the registry with the desired configuration.
    ///
    /// An empty list clears every manager. Otherwise each config is
    /// consolidated and validated, managers are built for names not yet
    /// registered, and `update_config` is applied to every listed manager
    /// that already exists. Any failure leaves the registry as it was.
    /// Managers missing from a non-empty list are kept. When a name appears
    /// twice the last entry wins.
    pub fn update_registered_providers(
        &self,
        configs: &[EmbeddingServiceConfig],
        deps: &ManagerDeps,
    ) -> EmbeddingResult<()> {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if configs.is_empty() {
            info!(removed = self.managers.len(), "clearing all registered embedding models");
            self.managers.clear();
            return Ok(());
        }

        let mut desired: Vec<(String, CanonicalModelConfig)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for service_config in configs {
            let canonical = CanonicalModelConfig::create(
                &service_config.model_name,
                service_config.embedding_provider,
                &service_config.config,
            );
            canonical.validate()?;
            let key = registry_key(&service_config.model_name);
            match positions.get(&key) {
                Some(&i) => desired[i].1 = canonical,
                None => {
                    positions.insert(key.clone(), desired.len());
                    desired.push((key, canonical));
                }
            }
        }

        // New managers are built before any existing one changes, so a
        // provider the factory rejects fails the reload with nothing applied.
        let mut created: Vec<(String, Arc<ProviderManager>)> = Vec::new();
        let mut changed: Vec<(Arc<ProviderManager>, CanonicalModelConfig)> = Vec::new();
        for (key, canonical) in desired {
            let existing = self.managers.get(&key).map(|m| Arc::clone(m.value()));
            match existing {
                Some(manager) => changed.push((manager, canonical)),
                None => {
                    let manager = ProviderManager::new(
                        canonical,
                        Arc::clone(&deps.factory),
                        deps.scheduler.clone(),
                        Arc::clone(&deps.metrics),
                    )?;
                    created.push((key, Arc::new(manager)));
                }
            }
        }

        let mut applied: Vec<(Arc<ProviderManager>, Arc<CanonicalModelConfig>)> = Vec::new();
        for (manager, canonical) in changed {
            let previous = manager.config();
            if let Err(e) = manager.update_config(canonical) {
                for (manager, previous) in applied.into_iter().rev() {
                    if let Err(rollback) = manager.update_config((*previous).clone()) {
                        warn!(
                            model = %manager.name(),
                            error = %rollback,
                            "failed to restore previous model config"
                        );
                    }
                }
                return Err(e);
            }
            applied.push((manager, previous));
        }

        for (key, manager) in created {
            info!(
                model = %manager.name(),
                provider = %manager.provider(),
                "registered embedding model"
            );
            self.managers.insert(key, manager);
        }
        debug!(registered = self.managers.len(), "embedding registry reconciled");
        Ok(())
    }

    /// Manager for `model`, or `ModelNotRegistered` listing what is.
    pub fn get_provider_manager(&self, model: &str) -> EmbeddingResult<Arc<ProviderManager>> {
        self.managers
            .get(&registry_key(model))
            .map(|m| Arc::clone(m.value()))
            .ok_or_else(|| EmbeddingError::ModelNotRegistered {
                model: model.to_string(),
                supported: self.registered_models(),
            })
    }

    /// Registered model names, sorted.
    pub fn registered_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .managers
            .iter()
            .map(|entry| entry.value().name().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn contains(&self, model: &str) -> bool {
        self.managers.contains_key(&registry_key(model))
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    pub fn clear(&self) {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.managers.clear();
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("models", &self.registered_models())
            .finish()
    }
}
