mod common;

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::*;
use embedgate_core::config::{ApiKeyCredentials, ErrorHandlingConfig, WorkloadOverrides};
use embedgate_core::{EmbeddingError, ServiceTier};
use embedgate_dispatch::metrics::{BATCH_SIZE_DISTRIBUTION, REQUEST_LATENCY, SUCCESSFUL_REQUESTS};
use embedgate_dispatch::{ProviderManager, TaskScheduler};
use embedgate_observability::InMemoryMetrics;

fn manager(
    config: &embedgate_core::EmbeddingServiceConfig,
    factory: Arc<FakeFactory>,
    metrics: Arc<InMemoryMetrics>,
) -> Arc<ProviderManager> {
    let scheduler = TaskScheduler::try_current("provider-manager-test").unwrap();
    Arc::new(ProviderManager::new(canonical(config), factory, scheduler, metrics).unwrap())
}

fn default_error_handling() -> ErrorHandlingConfig {
    ErrorHandlingConfig::new(0, 10, 20, 0.0)
}

/// Log sink shared between the subscriber and the assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn update_config_only_touches_clients_on_real_changes() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let factory = FakeFactory::new(ok_behavior());
    let pm = manager(&base, factory.clone(), Arc::new(InMemoryMetrics::new()));
    assert_eq!(factory.creates(), 3);
    assert_eq!(factory.updates(), 0);

    // Identical config.
    pm.update_config(canonical(&base)).unwrap();
    assert_eq!(factory.creates(), 3);
    assert_eq!(factory.updates(), 0);

    // Same token, new expiration date.
    let mut renewed = base.clone();
    renewed.config.credentials = ApiKeyCredentials::new("token123").with_expiration("2031-01-01");
    pm.update_config(canonical(&renewed)).unwrap();
    assert_eq!(factory.updates(), 0);

    // A real change updates every client in place.
    let resized = service_config(embedding_config(50, 120_000, default_error_handling()));
    pm.update_config(canonical(&resized)).unwrap();
    assert_eq!(factory.creates(), 3);
    assert_eq!(factory.updates(), 3);
    assert_eq!(pm.config().workload(ServiceTier::Query).model_config.batch_size(), 50);
}

#[tokio::test]
async fn rejected_client_update_keeps_the_previous_config() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let factory = FakeFactory::new(ok_behavior());
    let pm = manager(&base, factory.clone(), Arc::new(InMemoryMetrics::new()));

    let mut resized = service_config(embedding_config(50, 120_000, default_error_handling()));
    resized.config.credentials = ApiKeyCredentials::new("rotated-token");
    factory.fail_next_updates(1);

    let err = pm.update_config(canonical(&resized)).unwrap_err();
    assert!(err.is_transient());
    assert_eq!(pm.config().workload(ServiceTier::Query).model_config.batch_size(), 100);
    assert_eq!(factory.applied_batch_sizes(), vec![100, 100, 100]);
    assert_eq!(pm.rate_limiter_count(), 1);

    // The same reload applied again reaches every client.
    pm.update_config(canonical(&resized)).unwrap();
    assert_eq!(pm.config().workload(ServiceTier::Query).model_config.batch_size(), 50);
    assert_eq!(factory.applied_batch_sizes(), vec![50, 50, 50]);
    assert_eq!(pm.rate_limiter_count(), 2);
    assert_eq!(factory.creates(), 3);
}

#[tokio::test]
async fn tiers_sharing_credentials_share_a_rate_limiter() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let pm = manager(&base, FakeFactory::new(ok_behavior()), Arc::new(InMemoryMetrics::new()));
    assert_eq!(pm.rate_limiter_count(), 1);

    let mut split = base.clone();
    split.config.query = Some(WorkloadOverrides {
        credentials: Some(ApiKeyCredentials::new("query-token")),
        ..Default::default()
    });
    let pm = manager(&split, FakeFactory::new(ok_behavior()), Arc::new(InMemoryMetrics::new()));
    assert_eq!(pm.rate_limiter_count(), 2);
}

#[tokio::test]
async fn new_credentials_add_a_rate_limiter_on_update() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let pm = manager(&base, FakeFactory::new(ok_behavior()), Arc::new(InMemoryMetrics::new()));

    let mut rotated = base.clone();
    rotated.config.credentials = ApiKeyCredentials::new("rotated-token");
    pm.update_config(canonical(&rotated)).unwrap();

    // Limiters for old credentials are kept.
    assert_eq!(pm.rate_limiter_count(), 2);
}

#[tokio::test]
async fn updated_error_handling_applies_to_new_requests() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let factory = FakeFactory::new(behavior(|_texts| Err(EmbeddingError::transient("flaky"))));
    let pm = manager(&base, factory.clone(), Arc::new(InMemoryMetrics::new()));

    let err = pm
        .embed_async(strings(&["a"]), ServiceTier::CollectionScan, ctx())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(factory.total_calls(), 1);

    let retrying = service_config(embedding_config(
        100,
        120_000,
        ErrorHandlingConfig::new(2, 1, 2, 0.0),
    ));
    pm.update_config(canonical(&retrying)).unwrap();

    pm.embed_async(strings(&["a"]), ServiceTier::CollectionScan, ctx())
        .await
        .unwrap_err();
    assert_eq!(factory.total_calls(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn in_flight_request_survives_a_config_reload() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let factory = FakeFactory::new(behavior(|texts| {
        std::thread::sleep(Duration::from_millis(100));
        Ok(length_vectors(texts))
    }));
    let pm = manager(&base, factory.clone(), Arc::new(InMemoryMetrics::new()));

    let texts = strings(&["in", "flight"]);
    let task = pm.embed_async(texts.clone(), ServiceTier::ChangeStream, ctx());
    tokio::time::sleep(Duration::from_millis(20)).await;

    let reloaded = service_config(embedding_config(10, 60_000, default_error_handling()));
    pm.update_config(canonical(&reloaded)).unwrap();

    assert_eq!(task.await.unwrap(), length_vectors(&texts));
    assert_eq!(factory.updates(), 3);
}

#[tokio::test]
async fn async_path_records_batch_size_and_latency() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let metrics = Arc::new(InMemoryMetrics::new());
    let pm = manager(&base, FakeFactory::new(ok_behavior()), metrics.clone());

    pm.embed_async(strings(&["a", "b", "c"]), ServiceTier::ChangeStream, ctx())
        .await
        .unwrap();

    let t = tags(ServiceTier::ChangeStream);
    let sizes = metrics.summary(BATCH_SIZE_DISTRIBUTION, &t);
    assert_eq!(sizes.count, 1);
    assert_eq!(sizes.sum, 3.0);
    assert_eq!(metrics.latency(REQUEST_LATENCY, &t).count, 1);
    assert_eq!(metrics.counter(SUCCESSFUL_REQUESTS, &t), 1);
    assert_eq!(metrics.counter(SUCCESSFUL_REQUESTS, &tags(ServiceTier::Query)), 0);
}

#[tokio::test]
async fn client_side_rate_limit_rejections_log_a_warning() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let pm = manager(&base, FakeFactory::new(ok_behavior()), Arc::new(InMemoryMetrics::new()));

    let tasks: Vec<_> = (0..61)
        .map(|_| pm.embed_async(strings(&["a"]), ServiceTier::ChangeStream, ctx()))
        .collect();
    let results = futures::future::join_all(tasks).await;

    assert!(results.iter().any(|r| r.is_err()));
    assert!(logs.contents().contains("client-side rate limit exceeded"));
}

#[tokio::test]
async fn sync_path_returns_the_client_error_unchanged() {
    let base = service_config(embedding_config(100, 120_000, default_error_handling()));
    let factory = FakeFactory::new(behavior(|_texts| {
        Err(EmbeddingError::batch_too_large("too many tokens"))
    }));
    let pm = manager(&base, factory.clone(), Arc::new(InMemoryMetrics::new()));

    let err = pm
        .embed(&strings(&["q"]), ServiceTier::Query, &ctx())
        .unwrap_err();
    assert_eq!(err, EmbeddingError::batch_too_large("too many tokens"));
    assert_eq!(factory.total_calls(), 1);
}
