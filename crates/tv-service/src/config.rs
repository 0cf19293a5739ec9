//! Token Verifier configuration.
//!
//! Configuration is loaded from environment variables. The cache URL may
//! embed credentials and is redacted in Debug output.

use crate::auth::issuers::{IssuerConfig, IssuerTable};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Maximum allowed JWKS cache TTL in seconds (24 hours).
///
/// Bounds misconfiguration: a longer TTL would delay pickup of issuer key
/// rotations past any reasonable rotation window.
pub const MAX_JWKS_CACHE_TTL_SECONDS: u64 = 86_400;

/// Default instance ID prefix.
pub const DEFAULT_INSTANCE_ID_PREFIX: &str = "tv";

/// Token Verifier configuration.
///
/// Loaded from environment variables with sensible defaults.
/// The cache URL is redacted in Debug output to prevent credential leakage.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Exact-match origins allowed by the CORS gate.
    ///
    /// An empty list means no cross-origin reads are permitted.
    pub allowed_origins: Vec<String>,

    /// Configured identity providers, keyed by issuer key (e.g. "auth0").
    pub issuers: IssuerTable,

    /// Connection URL for the shared key-value cache store.
    pub cache_url: String,

    /// How long a fetched JWKS document is trusted.
    pub jwks_cache_ttl: Duration,

    /// Unique identifier for this instance, used in logs.
    pub instance_id: String,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("allowed_origins", &self.allowed_origins)
            .field("issuers", &self.issuers)
            .field("cache_url", &"[REDACTED]")
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid issuer table: {0}")]
    InvalidIssuerTable(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidCacheTtl(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        // Comma-separated exact-match origins; surrounding whitespace is
        // tolerated, empty entries are dropped.
        let allowed_origins: Vec<String> = vars
            .get("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let issuers_json = vars
            .get("TV_ISSUERS")
            .ok_or_else(|| ConfigError::MissingEnvVar("TV_ISSUERS".to_string()))?;

        let issuer_map: HashMap<String, IssuerConfig> = serde_json::from_str(issuers_json)
            .map_err(|e| {
                ConfigError::InvalidIssuerTable(format!("TV_ISSUERS must be a JSON object: {e}"))
            })?;

        let issuers = IssuerTable::new(issuer_map).map_err(ConfigError::InvalidIssuerTable)?;

        let cache_url = vars
            .get("CACHE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CACHE_URL".to_string()))?
            .clone();

        // Parse JWKS cache TTL with validation
        let jwks_cache_ttl_seconds = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidCacheTtl(
                    "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_JWKS_CACHE_TTL_SECONDS {
                return Err(ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must not exceed {MAX_JWKS_CACHE_TTL_SECONDS} seconds, got {value}"
                )));
            }

            value
        } else {
            DEFAULT_JWKS_CACHE_TTL_SECONDS
        };

        // Generate instance ID
        let instance_id = vars.get("TV_INSTANCE_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_INSTANCE_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            bind_address,
            allowed_origins,
            issuers,
            cache_url,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_seconds),
            instance_id,
        })
    }
}
