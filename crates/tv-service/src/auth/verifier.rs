//! Token verification pipeline.
//!
//! Validates incoming bearer tokens against the configured issuer table,
//! resolving signing keys through the shared JWKS cache.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only asymmetric algorithms are accepted (`RS256`, `EdDSA`); `none`
//!   and all HMAC algorithms are rejected before any key is resolved
//! - The issuer is read unverified only to select configuration; trust is
//!   established by the signature check against that issuer's published keys
//! - Expiry and audience are enforced with the audience pinned to the
//!   issuer's configured value

use crate::auth::claims::Claims;
use crate::auth::issuers::IssuerTable;
use crate::auth::jwks::{Jwk, JwksCache};
use crate::auth::token::{self, TokenParseError};
use crate::errors::TvError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::instrument;

/// Verifies bearer tokens issued by the configured identity providers.
pub struct TokenVerifier {
    /// Configured identity providers.
    issuers: IssuerTable,

    /// Signing key resolver.
    jwks: JwksCache,
}

impl TokenVerifier {
    /// Create a new verifier.
    pub fn new(issuers: IssuerTable, jwks: JwksCache) -> Self {
        Self { issuers, jwks }
    }

    /// Verify a token and return its claims.
    ///
    /// The pipeline is linear with early returns:
    ///
    /// 1. Decode the header (unverified) for `alg` and `kid`
    /// 2. Gate the declared algorithm to the asymmetric allow-list
    /// 3. Read `iss` (unverified) and match it against the issuer table
    /// 4. Resolve the signing key by `kid` through the JWKS cache
    /// 5. Verify the signature and the `exp`/`aud` claims
    ///
    /// # Errors
    ///
    /// Returns the matching `TvError` variant for each failure class; see
    /// the error type for the HTTP mapping.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<Claims, TvError> {
        // 1. Header (unverified)
        let header = token::decode_header(token).map_err(|e| {
            tracing::debug!(target: "tv.auth.verifier", error = ?e, "Token header decode failed");
            TvError::MalformedToken
        })?;

        // 2. Algorithm gate, before any key work
        let algorithm = match header.alg.as_str() {
            "RS256" => Algorithm::RS256,
            "EdDSA" => Algorithm::EdDSA,
            other => {
                tracing::warn!(target: "tv.auth.verifier", alg = %other, "Rejected token algorithm");
                return Err(TvError::InvalidSignature);
            }
        };

        // 3. Issuer dispatch (unverified read, exact-URL match)
        let iss = token::peek_issuer(token).map_err(|e| {
            tracing::debug!(target: "tv.auth.verifier", error = ?e, "Token issuer read failed");
            match e {
                TokenParseError::MissingIssuer => TvError::UnknownIssuer,
                _ => TvError::MalformedToken,
            }
        })?;

        let (issuer_key, issuer) = self.issuers.by_issuer_url(&iss).ok_or_else(|| {
            tracing::debug!(target: "tv.auth.verifier", "Token issuer is not configured");
            TvError::UnknownIssuer
        })?;

        // 4. Signing key resolution
        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| {
                tracing::debug!(target: "tv.auth.verifier", "Token header has no kid");
                TvError::SigningKeyNotFound
            })?;

        let jwk = self.jwks.signing_key(issuer_key, issuer, &kid).await?;
        let decoding_key = decoding_key_for(&jwk, algorithm)?;

        // 5. Signature + claims verification
        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[issuer.audience.as_str()]);
        validation.set_issuer(&[issuer.issuer_url.as_str()]);
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            let error = map_verification_error(&e);
            tracing::debug!(
                target: "tv.auth.verifier",
                error = %e,
                mapped = error.metric_label(),
                "Token verification failed"
            );
            error
        })?;

        tracing::debug!(target: "tv.auth.verifier", issuer = %issuer.name, "Token verified");
        Ok(token_data.claims)
    }
}

/// Build a decoding key from a JWK, checking that the key material matches
/// the algorithm declared in the token header.
fn decoding_key_for(jwk: &Jwk, algorithm: Algorithm) -> Result<DecodingKey, TvError> {
    // A JWK that declares an algorithm must agree with the token header.
    if let Some(alg) = &jwk.alg {
        let matches_header = matches!(
            (algorithm, alg.as_str()),
            (Algorithm::RS256, "RS256") | (Algorithm::EdDSA, "EdDSA")
        );
        if !matches_header {
            tracing::warn!(target: "tv.auth.verifier", kid = %jwk.kid, jwk_alg = %alg, "JWK algorithm does not match token header");
            return Err(TvError::SigningKeyNotFound);
        }
    }

    match (algorithm, jwk.kty.as_str()) {
        (Algorithm::RS256, "RSA") => {
            let (n, e) = match (&jwk.n, &jwk.e) {
                (Some(n), Some(e)) => (n, e),
                _ => {
                    tracing::error!(target: "tv.auth.verifier", kid = %jwk.kid, "RSA JWK missing modulus or exponent");
                    return Err(TvError::SigningKeyNotFound);
                }
            };

            DecodingKey::from_rsa_components(n, e).map_err(|e| {
                tracing::error!(target: "tv.auth.verifier", kid = %jwk.kid, error = %e, "Invalid RSA key components");
                TvError::SigningKeyNotFound
            })
        }
        (Algorithm::EdDSA, "OKP") => {
            let x = jwk.x.as_ref().ok_or_else(|| {
                tracing::error!(target: "tv.auth.verifier", kid = %jwk.kid, "OKP JWK missing x field");
                TvError::SigningKeyNotFound
            })?;

            let public_key_bytes = URL_SAFE_NO_PAD.decode(x).map_err(|e| {
                tracing::error!(target: "tv.auth.verifier", kid = %jwk.kid, error = %e, "Invalid public key encoding");
                TvError::SigningKeyNotFound
            })?;

            Ok(DecodingKey::from_ed_der(&public_key_bytes))
        }
        (_, kty) => {
            tracing::warn!(target: "tv.auth.verifier", kid = %jwk.kid, kty = %kty, "JWK key type does not match token algorithm");
            Err(TvError::SigningKeyNotFound)
        }
    }
}

/// Map `jsonwebtoken` failures onto the verification error taxonomy.
fn map_verification_error(error: &jsonwebtoken::errors::Error) -> TvError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => TvError::TokenExpired,
        ErrorKind::ImmatureSignature => TvError::TokenExpired,
        ErrorKind::InvalidAudience => TvError::InvalidAudience,
        ErrorKind::InvalidIssuer => TvError::UnknownIssuer,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "exp" => TvError::TokenExpired,
            "aud" => TvError::InvalidAudience,
            "iss" => TvError::UnknownIssuer,
            _ => TvError::MalformedToken,
        },
        ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::InvalidToken => {
            TvError::MalformedToken
        }
        _ => TvError::InvalidSignature,
    }
}
