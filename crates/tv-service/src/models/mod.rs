//! Token Verifier models.
//!
//! Request and response types for the HTTP surface.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/v1/auth/verify/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyRequest {
    /// The bearer token to verify.
    pub token: String,
}

/// Successful verification response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Subject claim of the verified token.
    pub user_id: String,
}

/// Health check response.
///
/// Returned by the `/v1/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy" or "unhealthy").
    pub status: String,

    /// Cache store connectivity status (optional, for detailed health).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
}
