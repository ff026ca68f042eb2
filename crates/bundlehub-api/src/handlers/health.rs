//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::dto::response::{HealthChecks, HealthResponse, QueueDepth};
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match state.object_store.health_check().await {
        Ok(()) => "ok",
        Err(err) => {
            warn!(error = %err, "Storage health check failed");
            "error"
        }
    };

    let (standard, low) = state.queue.len().await;

    Json(HealthResponse {
        status: if storage == "ok" { "healthy" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            storage: storage.to_string(),
        },
        queue: QueueDepth { standard, low },
        jobs: state.registry.len(),
    })
}
