//! Route definitions for the BundleHub HTTP API.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/download/initiate", post(handlers::download::initiate))
        .route("/download/status/:job_id", get(handlers::download::status))
        .route("/download/:job_id", get(handlers::download::resolve))
        .route(
            "/download/:job_id/cancel",
            post(handlers::download::cancel),
        );

    Router::new()
        .nest("/v1", v1)
        .route("/health", get(handlers::health::health))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}
