//! CORS gate.
//!
//! Every request passes through this layer. Origins are matched exactly
//! against the configured allow-list:
//!
//! - Preflight (`OPTIONS`) requests from an allowed origin are answered
//!   with the allow headers; disallowed origins receive no CORS headers
//!   (the browser blocks the cross-origin read client-side).
//! - Actual requests from an allowed origin get the origin echoed back in
//!   `Access-Control-Allow-Origin` regardless of the handler outcome.
//!   Disallowed origins still reach the handler - the gate only withholds
//!   the headers.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer from the configured exact-match origin list.
///
/// Origins that are not valid header values are dropped with a warning;
/// they could never match a real `Origin` header anyway.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(
                    target: "tv.middleware.cors",
                    origin = %origin,
                    "Dropping allowed origin that is not a valid header value"
                );
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
