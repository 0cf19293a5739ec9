//! Token Verifier error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse`
//! impl. Messages returned to clients name the failure class but never the
//! underlying cause; precise causes are logged server-side where the error
//! is produced.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Token Verifier error type.
///
/// Maps to appropriate HTTP status codes:
/// - InvalidRequestBody: 400 Bad Request
/// - MalformedToken, UnknownIssuer, SigningKeyNotFound, InvalidSignature,
///   TokenExpired, InvalidAudience: 401 Unauthorized
/// - Internal: 500 Internal Server Error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TvError {
    #[error("Invalid request body")]
    InvalidRequestBody,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token issuer is not recognized")]
    UnknownIssuer,

    #[error("No signing key found for token")]
    SigningKeyNotFound,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token audience is invalid")]
    InvalidAudience,

    #[error("An internal error occurred")]
    Internal,
}

impl TvError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            TvError::InvalidRequestBody => 400,
            TvError::MalformedToken
            | TvError::UnknownIssuer
            | TvError::SigningKeyNotFound
            | TvError::InvalidSignature
            | TvError::TokenExpired
            | TvError::InvalidAudience => 401,
            TvError::Internal => 500,
        }
    }

    /// Bounded label for metrics (one value per variant).
    pub fn metric_label(&self) -> &'static str {
        match self {
            TvError::InvalidRequestBody => "invalid_request_body",
            TvError::MalformedToken => "malformed_token",
            TvError::UnknownIssuer => "unknown_issuer",
            TvError::SigningKeyNotFound => "signing_key_not_found",
            TvError::InvalidSignature => "invalid_signature",
            TvError::TokenExpired => "token_expired",
            TvError::InvalidAudience => "invalid_audience",
            TvError::Internal => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for TvError {
    fn into_response(self) -> Response {
        let status = match self.status_code() {
            400 => StatusCode::BAD_REQUEST,
            401 => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(target: "tv.errors", error = %self, "Internal error surfaced to client");
        }

        let error_response = ErrorResponse {
            message: self.to_string(),
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"token-verifier\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
