use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the cache database is reachable.
    pub db_healthy: bool,
    /// Refresh requests waiting for the worker.
    pub queue_depth: usize,
}

/// GET /health -- returns service, database and refresh queue health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state.store.health_check().await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        queue_depth: state.refresh_queue.depth(),
    })
}

/// Mount health check routes. The static path wins over the player route, so
/// `/health` is never treated as an identifier.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
