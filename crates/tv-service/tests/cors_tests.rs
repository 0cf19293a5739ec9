//! CORS gate integration tests.
//!
//! Exercises preflight handling and origin echo against a running server:
//! allowed origins are echoed back on success AND failure responses,
//! disallowed origins receive no CORS headers while the endpoint still
//! executes.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use tv_service::auth::{JwksCache, TokenVerifier};
use tv_service::cache::MemoryStore;
use tv_service::config::Config;
use tv_service::routes::{self, AppState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALLOWED_ORIGIN: &str = "https://app.example.com";
const OTHER_ALLOWED_ORIGIN: &str = "https://admin.example.com";
const DISALLOWED_ORIGIN: &str = "https://evil.example.com";
const TEST_AUDIENCE: &str = "https://api.example.com";

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

fn get_test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            routes::init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

#[derive(Debug, Clone, Serialize)]
struct TestClaims {
    iss: String,
    sub: String,
    aud: String,
    exp: i64,
    iat: i64,
}

/// Build PKCS#8 v1 document from Ed25519 seed.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::new();

    pkcs8.push(0x30);
    pkcs8.push(0x2e);
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);
    pkcs8.push(0x30);
    pkcs8.push(0x05);
    pkcs8.extend_from_slice(&[0x06, 0x03, 0x2b, 0x65, 0x70]);
    pkcs8.push(0x04);
    pkcs8.push(0x22);
    pkcs8.push(0x04);
    pkcs8.push(0x20);
    pkcs8.extend_from_slice(seed);

    pkcs8
}

/// Test server with an allow-listed origin set.
struct TestServer {
    addr: SocketAddr,
    _server_handle: JoinHandle<()>,
    mock_server: MockServer,
    private_key_pkcs8: Vec<u8>,
}

impl TestServer {
    async fn spawn() -> Result<Self> {
        let mock_server = MockServer::start().await;

        let seed = [7u8; 32];
        let key_pair =
            Ed25519KeyPair::from_seed_unchecked(&seed).expect("Failed to create test keypair");
        let public_key_bytes = key_pair.public_key().as_ref().to_vec();
        let private_key_pkcs8 = build_pkcs8_from_seed(&seed);

        let jwks_response = serde_json::json!({
            "keys": [{
                "kty": "OKP",
                "kid": "cors-test-key",
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(&public_key_bytes),
                "alg": "EdDSA",
                "use": "sig"
            }]
        });

        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&jwks_response))
            .mount(&mock_server)
            .await;

        let issuers = serde_json::json!({
            "test-idp": {
                "issuer_url": mock_server.uri(),
                "jwks_path": "/.well-known/jwks.json",
                "audience": TEST_AUDIENCE,
                "name": "Test IdP"
            }
        })
        .to_string();

        let vars = HashMap::from([
            ("TV_ISSUERS".to_string(), issuers),
            (
                "CACHE_URL".to_string(),
                "redis://localhost:6379".to_string(),
            ),
            (
                "ALLOWED_ORIGINS".to_string(),
                format!("{ALLOWED_ORIGIN},{OTHER_ALLOWED_ORIGIN}"),
            ),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let store = Arc::new(MemoryStore::new());
        let jwks = JwksCache::new(store.clone(), config.jwks_cache_ttl);
        let verifier = Arc::new(TokenVerifier::new(config.issuers.clone(), jwks));

        let state = Arc::new(AppState {
            config,
            verifier,
            store,
        });

        let metrics_handle = get_test_metrics_handle();
        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            _server_handle: server_handle,
            mock_server,
            private_key_pkcs8,
        })
    }

    fn verify_url(&self) -> String {
        format!("http://{}/api/v1/auth/verify/", self.addr)
    }

    fn create_valid_token(&self) -> String {
        let now = Utc::now().timestamp();
        let claims = TestClaims {
            iss: self.mock_server.uri(),
            sub: "cors-test-user".to_string(),
            aud: TEST_AUDIENCE.to_string(),
            exp: now + 3600,
            iat: now,
        };

        let encoding_key = EncodingKey::from_ed_der(&self.private_key_pkcs8);
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());
        header.kid = Some("cors-test-key".to_string());

        encode(&header, &claims, &encoding_key).expect("Failed to sign token")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self._server_handle.abort();
    }
}

fn allow_origin_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

// =============================================================================
// Preflight
// =============================================================================

/// Preflight from an allowed origin gets the full set of CORS headers.
#[tokio::test]
async fn test_preflight_allowed_origin() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, server.verify_url())
        .header("Origin", ALLOWED_ORIGIN)
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        allow_origin_header(&response).as_deref(),
        Some(ALLOWED_ORIGIN)
    );

    let allow_methods = response
        .headers()
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(allow_methods.contains("POST"), "was: {allow_methods}");
    assert!(allow_methods.contains("GET"), "was: {allow_methods}");
    assert!(allow_methods.contains("OPTIONS"), "was: {allow_methods}");

    let allow_headers = response
        .headers()
        .get("access-control-allow-headers")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();
    assert!(allow_headers.contains("content-type"), "was: {allow_headers}");
    assert!(
        allow_headers.contains("authorization"),
        "was: {allow_headers}"
    );

    Ok(())
}

/// Every configured origin is echoed back exactly.
#[tokio::test]
async fn test_preflight_echoes_each_allowed_origin() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = reqwest::Client::new();

    for origin in [ALLOWED_ORIGIN, OTHER_ALLOWED_ORIGIN] {
        let response = client
            .request(reqwest::Method::OPTIONS, server.verify_url())
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await?;

        assert_eq!(allow_origin_header(&response).as_deref(), Some(origin));
    }

    Ok(())
}

/// Preflight from a disallowed origin gets no CORS headers.
#[tokio::test]
async fn test_preflight_disallowed_origin_gets_no_cors_headers() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, server.verify_url())
        .header("Origin", DISALLOWED_ORIGIN)
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    assert!(
        allow_origin_header(&response).is_none(),
        "disallowed origin must not be echoed"
    );

    Ok(())
}

// =============================================================================
// Actual requests
// =============================================================================

/// An allowed origin is echoed on a successful verification response.
#[tokio::test]
async fn test_allowed_origin_echoed_on_success() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.create_valid_token();

    let response = reqwest::Client::new()
        .post(server.verify_url())
        .header("Origin", ALLOWED_ORIGIN)
        .json(&serde_json::json!({ "token": token }))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        allow_origin_header(&response).as_deref(),
        Some(ALLOWED_ORIGIN)
    );

    Ok(())
}

/// An allowed origin is echoed on failure responses too - the gate's
/// outcome does not depend on the handler's.
#[tokio::test]
async fn test_allowed_origin_echoed_on_failure() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(server.verify_url())
        .header("Origin", ALLOWED_ORIGIN)
        .json(&serde_json::json!({ "token": "not-a-jwt" }))
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    assert_eq!(
        allow_origin_header(&response).as_deref(),
        Some(ALLOWED_ORIGIN)
    );

    Ok(())
}

/// A disallowed origin still reaches the endpoint - the request executes
/// and the response simply carries no CORS headers.
#[tokio::test]
async fn test_disallowed_origin_still_executes_endpoint() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.create_valid_token();

    let response = reqwest::Client::new()
        .post(server.verify_url())
        .header("Origin", DISALLOWED_ORIGIN)
        .json(&serde_json::json!({ "token": token }))
        .send()
        .await?;

    // The verification ran and succeeded; only the CORS headers are withheld
    assert_eq!(response.status(), 200);
    assert!(allow_origin_header(&response).is_none());

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["user_id"], "cors-test-user");

    Ok(())
}

/// Requests without an Origin header (same-origin, curl) get no CORS
/// headers and work normally.
#[tokio::test]
async fn test_no_origin_header_gets_no_cors_headers() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.create_valid_token();

    let response = reqwest::Client::new()
        .post(server.verify_url())
        .json(&serde_json::json!({ "token": token }))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert!(allow_origin_header(&response).is_none());

    Ok(())
}
