//! Shared test helpers for integration tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tokio::sync::watch;
use tower::ServiceExt;

use bundlehub_core::config::AppConfig;
use bundlehub_core::traits::clock::{Clock, SystemClock};
use bundlehub_core::traits::storage::{ObjectStore, PresignedUrl, StorageError};
use bundlehub_core::types::id::JobId;
use bundlehub_entity::job::{DownloadJob, DownloadRequest, JobPriority};
use bundlehub_registry::{JobRegistry, RegistrySweeper};
use bundlehub_service::DownloadService;
use bundlehub_storage::MemoryObjectStore;
use bundlehub_worker::{ArtifactStager, WorkQueue, WorkerPool};

/// Object store that replays a scripted failure sequence on writes
/// before delegating to an in-memory store.
#[derive(Debug)]
pub struct ScriptedStore {
    script: std::sync::Mutex<VecDeque<StorageError>>,
    inner: MemoryObjectStore,
    puts: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(script: Vec<StorageError>, config: &AppConfig) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            inner: MemoryObjectStore::new(&config.storage, Arc::new(SystemClock)),
            puts: AtomicUsize::new(0),
        }
    }

    /// How many times the worker tried to write an artifact.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    fn provider_type(&self) -> &str {
        "scripted"
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().expect("script lock").pop_front();
        if let Some(err) = scripted {
            return Err(err);
        }
        self.inner.put_object(key, data).await
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        self.inner.presign_get(key, ttl).await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A running engine (registry + queue + pool + sweeper + façade) built
/// around a scripted store, without the HTTP layer.
pub struct TestEngine {
    pub config: AppConfig,
    pub registry: Arc<JobRegistry>,
    pub queue: Arc<WorkQueue>,
    pub service: Arc<DownloadService>,
    pub store: Arc<ScriptedStore>,
    pool: Arc<WorkerPool>,
    sweeper_shutdown: watch::Sender<bool>,
}

impl TestEngine {
    /// Assemble and start an engine with the given config and script.
    pub async fn start(config: AppConfig, script: Vec<StorageError>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(ScriptedStore::new(script, &config));

        let registry = Arc::new(JobRegistry::new(Arc::clone(&clock)));
        let queue = Arc::new(WorkQueue::new(config.worker.queue_capacity));
        let stager = Arc::new(ArtifactStager::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&clock),
            config.storage.artifact_url_ttl(),
        ));

        let pool = Arc::new(WorkerPool::new(
            Arc::clone(&registry),
            Arc::clone(&queue),
            stager,
            Arc::clone(&clock),
            config.worker.clone(),
            config.jobs.clone(),
        ));
        pool.start().await;

        let (sweeper_shutdown, sweeper_rx) = watch::channel(false);
        let sweeper = RegistrySweeper::new(
            Arc::clone(&registry),
            Arc::clone(&clock),
            config.jobs.sweep_interval(),
        );
        tokio::spawn(sweeper.run(sweeper_rx));

        let service = Arc::new(DownloadService::new(
            Arc::clone(&registry),
            Arc::clone(&queue),
            clock,
            &config,
        ));

        Self {
            config,
            registry,
            queue,
            service,
            store,
            pool,
            sweeper_shutdown,
        }
    }

    /// Stop workers and the sweeper.
    pub async fn stop(&self) {
        self.pool.stop().await;
        let _ = self.sweeper_shutdown.send(true);
    }

    /// Poll the registry until `accept` returns true for the job's
    /// snapshot, panicking after `within`.
    pub async fn wait_for<F>(&self, id: JobId, within: Duration, accept: F) -> DownloadJob
    where
        F: Fn(&DownloadJob) -> bool,
    {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            if let Some(job) = self.registry.get(&id) {
                if accept(&job) {
                    return job;
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {id} did not reach the expected state within {within:?}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Poll until the job reaches any terminal state.
    pub async fn wait_for_terminal(&self, id: JobId, within: Duration) -> DownloadJob {
        self.wait_for(id, within, |job| job.status.is_terminal()).await
    }
}

/// Engine configuration tuned so scenarios finish in milliseconds.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.provider = "memory".to_string();
    config.worker.concurrency = 2;
    config.worker.progress_tick_interval_ms = 20;
    config.worker.backoff_base_ms = 10;
    config.worker.backoff_max_ms = 40;
    config.worker.shutdown_grace_seconds = 2;
    config.jobs.delay_min_ms = 100;
    config.jobs.delay_max_ms = 100;
    config.jobs.sweep_interval_seconds = 30;
    config
}

/// A standard single-file request.
pub fn single_file_request() -> DownloadRequest {
    DownloadRequest {
        file_ids: vec![70_000],
        client_request_id: None,
        user_id: None,
        priority: JobPriority::Standard,
    }
}

/// A deduplicable request.
pub fn keyed_request(client_request_id: &str, user_id: &str) -> DownloadRequest {
    DownloadRequest {
        file_ids: vec![70_000],
        client_request_id: Some(client_request_id.to_string()),
        user_id: Some(user_id.to_string()),
        priority: JobPriority::Standard,
    }
}

/// Engine plus the HTTP router in front of it.
pub struct TestApp {
    pub router: Router,
    pub engine: TestEngine,
}

impl TestApp {
    /// Start an engine and mount the full router over it.
    pub async fn start(config: AppConfig) -> Self {
        let engine = TestEngine::start(config.clone(), Vec::new()).await;
        let state = bundlehub_api::state::AppState {
            config: Arc::new(config),
            download_service: Arc::clone(&engine.service),
            object_store: Arc::clone(&engine.store) as Arc<dyn ObjectStore>,
            queue: Arc::clone(&engine.queue),
            registry: Arc::clone(&engine.registry),
        };
        let router = bundlehub_api::router::build_router(state);
        Self { router, engine }
    }

    /// Make an HTTP request to the test app.
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed JSON body (null for non-JSON responses).
    pub body: Value,
}
