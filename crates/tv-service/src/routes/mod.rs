//! HTTP routes for the Token Verifier.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenVerifier;
use crate::cache::KeyValueStore;
use crate::config::Config;
use crate::handlers;
use crate::middleware::cors;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Token verification pipeline.
    pub verifier: Arc<TokenVerifier>,

    /// Shared cache store (health checks ping it directly).
    pub store: Arc<dyn KeyValueStore>,
}

/// Install the Prometheus metrics recorder.
///
/// Must be called once per process, before `build_routes`.
///
/// # Errors
///
/// Returns `BuildError` if a recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `POST /api/v1/auth/verify/` - Token verification
/// - `GET /health` - Liveness probe (plain text)
/// - `GET /v1/health` - Readiness probe (pings the cache store)
/// - `GET /metrics` - Prometheus metrics
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = cors::cors_layer(&state.config.allowed_origins);

    let routes = Router::new()
        .route("/api/v1/auth/verify/", post(handlers::verify_token))
        .route("/health", get(handlers::liveness))
        .route("/v1/health", get(handlers::readiness))
        .route(
            "/metrics",
            get(move || {
                let handle = metrics_handle.clone();
                async move { handle.render() }
            }),
        )
        .with_state(state);

    // Apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Preflight handling and origin echo (outermost, so CORS
    //    headers land on every response including errors)
    routes
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // AppState must implement Clone for Axum's State extractor.
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_config_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Config>();
    }
}
