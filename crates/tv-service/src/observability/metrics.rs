//! Metrics definitions for the Token Verifier.
//!
//! All metrics follow Prometheus naming conventions:
//! - `tv_` prefix for the Token Verifier
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: one value per error variant plus "success"
//! - `issuer`: the configured issuer keys (a closed set)
//! - `result` / `event`: small fixed vocabularies

use metrics::{counter, histogram};
use std::time::Duration;

/// Record a verification request completion.
///
/// Metric: `tv_verify_requests_total`, `tv_verify_duration_seconds`
/// Labels: `outcome`
pub fn record_verification(outcome: &'static str, duration: Duration) {
    histogram!("tv_verify_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("tv_verify_requests_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record an upstream JWKS fetch attempt.
///
/// Metric: `tv_jwks_fetches_total`
/// Labels: `issuer`, `result` (success, network_error, http_error,
/// parse_error)
pub fn record_jwks_fetch(issuer: &str, result: &'static str) {
    counter!("tv_jwks_fetches_total",
        "issuer" => issuer.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record a JWKS cache lookup outcome.
///
/// Metric: `tv_jwks_cache_total`
/// Labels: `issuer`, `event` (hit, miss, expired)
pub fn record_jwks_cache(issuer: &str, event: &'static str) {
    counter!("tv_jwks_cache_total",
        "issuer" => issuer.to_string(),
        "event" => event
    )
    .increment(1);
}
