//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use bundlehub_core::config::AppConfig;
use bundlehub_core::traits::storage::ObjectStore;
use bundlehub_registry::JobRegistry;
use bundlehub_service::DownloadService;
use bundlehub_worker::WorkQueue;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Download job façade
    pub download_service: Arc<DownloadService>,
    /// Object storage backend, exposed for health checks
    pub object_store: Arc<dyn ObjectStore>,
    /// Work queue, exposed for health diagnostics
    pub queue: Arc<WorkQueue>,
    /// Job registry, exposed for diagnostics
    pub registry: Arc<JobRegistry>,
}
