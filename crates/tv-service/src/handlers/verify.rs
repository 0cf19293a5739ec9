//! Token verification handler.
//!
//! The single write-path endpoint of the service: accepts a token, runs it
//! through the verification pipeline, and returns the authenticated
//! subject.

use crate::errors::TvError;
use crate::models::{VerifyRequest, VerifyResponse};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Handler for `POST /api/v1/auth/verify/`.
///
/// ## Request
///
/// ```json
/// { "token": "<compact signed token>" }
/// ```
///
/// ## Response
///
/// Returns 200 OK with the subject of the verified token:
///
/// ```json
/// { "user_id": "auth0|507f1f77bcf86cd799439011" }
/// ```
///
/// A missing or malformed body is 400; every verification failure is 401
/// with a `message` naming the failure class.
#[instrument(skip_all, name = "tv.handlers.verify")]
pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, TvError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(target: "tv.handlers.verify", error = %e, "Request body rejected");
        TvError::InvalidRequestBody
    })?;

    let started = Instant::now();
    let result = state.verifier.verify(&request.token).await;

    match result {
        Ok(claims) => {
            metrics::record_verification("success", started.elapsed());
            Ok(Json(VerifyResponse {
                user_id: claims.sub,
            }))
        }
        Err(error) => {
            metrics::record_verification(error.metric_label(), started.elapsed());
            Err(error)
        }
    }
}
