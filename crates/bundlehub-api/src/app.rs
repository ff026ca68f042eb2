//! Application bootstrap: engine assembly, server startup, shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_core::traits::clock::{Clock, SystemClock};
use bundlehub_core::traits::storage::ObjectStore;
use bundlehub_registry::{JobRegistry, RegistrySweeper};
use bundlehub_service::DownloadService;
use bundlehub_storage::{LocalObjectStore, MemoryObjectStore};
use bundlehub_worker::{ArtifactStager, WorkQueue, WorkerPool};

use crate::router::build_router;
use crate::state::AppState;

/// The assembled job engine plus its background tasks.
///
/// Integration tests use [`build_engine`] directly to drive the stack
/// without binding a socket; `run_server` wraps it with the HTTP layer.
pub struct Engine {
    /// Handler-facing state.
    pub state: AppState,
    pool: Arc<WorkerPool>,
    sweeper_shutdown: watch::Sender<bool>,
    sweeper_handle: JoinHandle<()>,
}

impl Engine {
    /// Stop the worker pool and the sweeper, in that order.
    pub async fn shutdown(self) {
        self.pool.stop().await;
        let _ = self.sweeper_shutdown.send(true);
        if let Err(err) = self.sweeper_handle.await {
            error!(error = %err, "Sweeper task did not join cleanly");
        }
    }
}

/// Construct the storage provider named by the configuration.
pub async fn build_object_store(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> AppResult<Arc<dyn ObjectStore>> {
    match config.storage.provider.as_str() {
        "local" => Ok(Arc::new(
            LocalObjectStore::new(&config.storage, clock).await?,
        )),
        "memory" => Ok(Arc::new(MemoryObjectStore::new(&config.storage, clock))),
        other => Err(AppError::configuration(format!(
            "Unknown storage provider '{other}'"
        ))),
    }
}

/// Assemble the registry, queue, worker pool, sweeper, and façade.
///
/// Workers and the sweeper are running when this returns.
pub async fn build_engine(config: AppConfig) -> AppResult<Engine> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_object_store(&config, Arc::clone(&clock)).await?;

    let registry = Arc::new(JobRegistry::new(Arc::clone(&clock)));
    let queue = Arc::new(WorkQueue::new(config.worker.queue_capacity));
    let stager = Arc::new(ArtifactStager::new(
        Arc::clone(&store),
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
    let sweeper_handle = tokio::spawn(sweeper.run(sweeper_rx));

    let download_service = Arc::new(DownloadService::new(
        Arc::clone(&registry),
        Arc::clone(&queue),
        Arc::clone(&clock),
        &config,
    ));

    let state = AppState {
        config: Arc::new(config),
        download_service,
        object_store: store,
        queue,
        registry,
    };

    Ok(Engine {
        state,
        pool,
        sweeper_shutdown,
        sweeper_handle,
    })
}

/// Run the HTTP server until SIGINT/SIGTERM, then drain the engine.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let engine = build_engine(config).await?;
    let router = build_router(engine.state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "BundleHub listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("Server stopped accepting connections; draining engine");
    engine.shutdown().await;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => error!(error = %err, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
