//! Health check handlers.
//!
//! Provides liveness and readiness endpoints for orchestrator probes.

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for `GET /health`.
///
/// Plain-text liveness probe: the process is up and serving.
pub async fn liveness() -> &'static str {
    "OK"
}

/// Handler for `GET /v1/health`.
///
/// Pings the cache store to verify connectivity and returns the service
/// status. Reports `unhealthy` without erroring - orchestrators need to
/// see the response either way.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "cache": "healthy"
/// }
/// ```
#[instrument(skip_all, name = "tv.health.check")]
pub async fn readiness(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cache_healthy = state.store.ping().await.is_ok();

    let response = if cache_healthy {
        HealthResponse {
            status: "healthy".to_string(),
            cache: Some("healthy".to_string()),
        }
    } else {
        HealthResponse {
            status: "unhealthy".to_string(),
            cache: Some("unhealthy".to_string()),
        }
    };

    Json(response)
}
