//! Unverified token parsing.
//!
//! Pre-verification utilities for the compact three-part token format:
//! size limits, header decoding, and an unverified read of the issuer
//! claim for multi-issuer dispatch.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any decoding (DoS prevention)
//! - Nothing here validates a signature; values read from these functions
//!   may only be used to select configuration and keys, never to trust
//!   the token

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

/// Maximum allowed token size in bytes (8KB).
///
/// Typical signed tokens are 200-800 bytes. The limit rejects oversized
/// inputs before base64 decoding or JSON parsing allocates anything.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Errors from unverified token parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenParseError {
    /// Token size exceeds `MAX_JWT_SIZE_BYTES`.
    #[error("token exceeds maximum allowed size")]
    TokenTooLarge,

    /// Token is not three dot-separated base64url segments with JSON content.
    #[error("token structure is invalid")]
    MalformedToken,

    /// Payload carries no usable `iss` claim.
    #[error("token payload has no issuer claim")]
    MissingIssuer,
}

/// Decoded (unverified) token header.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHeader {
    /// Declared signing algorithm.
    pub alg: String,

    /// Key ID used to select the signing key from the issuer's JWKS.
    #[serde(default)]
    pub kid: Option<String>,

    /// Token type (typically "JWT").
    #[serde(default)]
    pub typ: Option<String>,
}

/// Decode the header segment of a token without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds the size limit
/// - `MalformedToken` - wrong segment count, bad base64url, or invalid JSON
pub fn decode_header(token: &str) -> Result<TokenHeader, TokenParseError> {
    let parts = split_segments(token)?;

    let header_part = parts.first().ok_or(TokenParseError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "tv.auth.token", error = %e, "Failed to decode token header base64");
        TokenParseError::MalformedToken
    })?;

    serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "tv.auth.token", error = %e, "Failed to parse token header JSON");
        TokenParseError::MalformedToken
    })
}

/// Read the `iss` claim from the payload segment without verifying the
/// signature.
///
/// The returned URL selects an entry from the configured issuer table;
/// trust is established only after the signature verifies against that
/// issuer's published keys.
///
/// # Errors
///
/// - `TokenTooLarge` / `MalformedToken` - as for [`decode_header`]
/// - `MissingIssuer` - payload has no `iss` claim, or it is empty or not a
///   string
pub fn peek_issuer(token: &str) -> Result<String, TokenParseError> {
    let parts = split_segments(token)?;

    let payload_part = parts.get(1).ok_or(TokenParseError::MalformedToken)?;
    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_part).map_err(|e| {
        tracing::debug!(target: "tv.auth.token", error = %e, "Failed to decode token payload base64");
        TokenParseError::MalformedToken
    })?;

    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "tv.auth.token", error = %e, "Failed to parse token payload JSON");
        TokenParseError::MalformedToken
    })?;

    payload
        .get("iss")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(TokenParseError::MissingIssuer)
}

/// Split a token into its three segments, enforcing the size limit first.
fn split_segments(token: &str) -> Result<Vec<&str>, TokenParseError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "tv.auth.token",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(TokenParseError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "tv.auth.token",
            parts = parts.len(),
            "Token rejected: invalid segment count"
        );
        return Err(TokenParseError::MalformedToken);
    }

    Ok(parts)
}
