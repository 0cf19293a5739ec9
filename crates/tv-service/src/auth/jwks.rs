//! JWKS fetching and caching.
//!
//! Fetches key sets from each configured issuer's well-known endpoint and
//! caches them in the shared key-value store so repeated verifications
//! avoid refetching.
//!
//! # Cache contract
//!
//! - An entry is trusted only while its age is below the configured TTL;
//!   the store's own expiry is a second line of defense.
//! - A `kid` missing from a FRESH entry fails without a refetch - a stale
//!   cache miss surfaces as failure, never as a refetch loop.
//! - Store failures degrade to a direct fetch; the cache is a performance
//!   layer, not a trust anchor.
//! - Concurrent cold-cache fetches are tolerated: both fetch, both write,
//!   last write wins.

use crate::auth::issuers::IssuerConfig;
use crate::cache::KeyValueStore;
use crate::errors::TvError;
use crate::observability::metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// A single public key from a JWKS document.
///
/// Carries the fields for the two supported key families: RSA (`n`/`e`)
/// and OKP Ed25519 (`crv`/`x`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm the issuer intends this key for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Curve name (for OKP keys).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// Public key value (base64url encoded, for OKP keys).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
}

/// JWKS document as published by an issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksDocument {
    /// List of public keys.
    pub keys: Vec<Jwk>,
}

/// Cache entry: a fetched key set plus its fetch timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedJwks {
    keys: Vec<Jwk>,

    /// Unix epoch seconds at fetch time.
    fetched_at: i64,
}

impl CachedJwks {
    fn is_fresh(&self, now: i64, ttl: Duration) -> bool {
        let age = now.saturating_sub(self.fetched_at);
        age >= 0 && (age as u64) < ttl.as_secs()
    }

    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

/// JWKS resolver backed by the shared key-value store.
pub struct JwksCache {
    /// HTTP client for fetching JWKS documents.
    http_client: reqwest::Client,

    /// Shared cache store.
    store: Arc<dyn KeyValueStore>,

    /// How long a fetched key set is trusted.
    ttl: Duration,
}

impl JwksCache {
    /// Create a new JWKS cache over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "tv.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            store,
            ttl,
        }
    }

    /// Resolve the signing key with the given `kid` for an issuer.
    ///
    /// Consults the cache first; fetches the issuer's JWKS endpoint only on
    /// a cache miss or an expired entry. At most one upstream fetch happens
    /// per call.
    ///
    /// # Errors
    ///
    /// Returns `TvError::SigningKeyNotFound` when the key set (cached or
    /// freshly fetched) has no key with this `kid`, and for any upstream
    /// fetch failure - verification fails closed.
    #[instrument(skip(self, issuer), fields(issuer_key = %issuer_key, kid = %kid))]
    pub async fn signing_key(
        &self,
        issuer_key: &str,
        issuer: &IssuerConfig,
        kid: &str,
    ) -> Result<Jwk, TvError> {
        let cache_key = format!("jwks:{issuer_key}");
        let now = chrono::Utc::now().timestamp();

        if let Some(cached) = self.read_cache(&cache_key).await {
            if cached.is_fresh(now, self.ttl) {
                if let Some(key) = cached.find(kid) {
                    tracing::debug!(target: "tv.auth.jwks", kid = %kid, "JWKS cache hit");
                    metrics::record_jwks_cache(issuer_key, "hit");
                    return Ok(key.clone());
                }
                // Key not found in a fresh entry: fail rather than refetch,
                // so a bad kid cannot drive repeated upstream traffic.
                tracing::debug!(target: "tv.auth.jwks", kid = %kid, "Key not found in fresh JWKS cache");
                metrics::record_jwks_cache(issuer_key, "hit");
                return Err(TvError::SigningKeyNotFound);
            }
            metrics::record_jwks_cache(issuer_key, "expired");
        } else {
            metrics::record_jwks_cache(issuer_key, "miss");
        }

        // Cache miss or expired - fetch fresh JWKS
        let fetched = self.fetch_and_store(issuer_key, issuer, &cache_key, now).await?;

        match fetched.find(kid) {
            Some(key) => Ok(key.clone()),
            None => {
                tracing::warn!(
                    target: "tv.auth.jwks",
                    kid = %kid,
                    issuer = %issuer.name,
                    "Key not found in freshly fetched JWKS"
                );
                Err(TvError::SigningKeyNotFound)
            }
        }
    }

    /// Read and deserialize the cached entry; any failure degrades to a miss.
    async fn read_cache(&self, cache_key: &str) -> Option<CachedJwks> {
        let raw = match self.store.get(cache_key).await {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!(target: "tv.auth.jwks", error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                tracing::warn!(target: "tv.auth.jwks", error = %e, "Cached JWKS entry is unreadable, treating as miss");
                None
            }
        }
    }

    /// Fetch the issuer's JWKS document and write it back to the store.
    async fn fetch_and_store(
        &self,
        issuer_key: &str,
        issuer: &IssuerConfig,
        cache_key: &str,
        now: i64,
    ) -> Result<CachedJwks, TvError> {
        let jwks_url = issuer.jwks_url();
        tracing::debug!(target: "tv.auth.jwks", url = %jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "tv.auth.jwks", error = %e, issuer = %issuer.name, "Failed to fetch JWKS");
                metrics::record_jwks_fetch(issuer_key, "network_error");
                TvError::SigningKeyNotFound
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "tv.auth.jwks",
                status = %response.status(),
                issuer = %issuer.name,
                "JWKS endpoint returned error"
            );
            metrics::record_jwks_fetch(issuer_key, "http_error");
            return Err(TvError::SigningKeyNotFound);
        }

        let document: JwksDocument = response.json().await.map_err(|e| {
            tracing::error!(target: "tv.auth.jwks", error = %e, issuer = %issuer.name, "Failed to parse JWKS response");
            metrics::record_jwks_fetch(issuer_key, "parse_error");
            TvError::SigningKeyNotFound
        })?;

        tracing::info!(
            target: "tv.auth.jwks",
            issuer = %issuer.name,
            key_count = document.keys.len(),
            "JWKS cache refreshed"
        );
        metrics::record_jwks_fetch(issuer_key, "success");

        let cached = CachedJwks {
            keys: document.keys,
            fetched_at: now,
        };

        // Write-back failures are logged, never surfaced: the next request
        // simply fetches again.
        match serde_json::to_string(&cached) {
            Ok(serialized) => {
                if let Err(e) = self.store.put(cache_key, &serialized, self.ttl).await {
                    tracing::warn!(target: "tv.auth.jwks", error = %e, "Failed to write JWKS cache entry");
                }
            }
            Err(e) => {
                tracing::warn!(target: "tv.auth.jwks", error = %e, "Failed to serialize JWKS cache entry");
            }
        }

        Ok(cached)
    }
}
