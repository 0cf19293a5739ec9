//! Configured identity providers.
//!
//! Trust is closed-world: only issuers present in the configured table are
//! accepted, and lookup is by exact issuer-URL match against the token's
//! `iss` claim. The table is built once at startup and immutable thereafter.

use serde::Deserialize;
use std::collections::HashMap;

/// A single configured identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuerConfig {
    /// Issuer URL, compared exactly against the token `iss` claim.
    pub issuer_url: String,

    /// Path appended to `issuer_url` to reach the JWKS document.
    pub jwks_path: String,

    /// Audience this service expects tokens to carry for this issuer.
    pub audience: String,

    /// Human-readable provider name, used in logs.
    pub name: String,
}

impl IssuerConfig {
    /// Full URL of the issuer's JWKS document.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.issuer_url, self.jwks_path)
    }
}

/// Closed mapping from issuer key (e.g. "auth0") to provider configuration.
#[derive(Debug, Clone)]
pub struct IssuerTable {
    entries: HashMap<String, IssuerConfig>,
}

impl IssuerTable {
    /// Build a table from configured entries, validating that it is
    /// non-empty and that issuer URLs are unique (reverse lookup by `iss`
    /// must be unambiguous).
    ///
    /// # Errors
    ///
    /// Returns a description of the first validation failure.
    pub fn new(entries: HashMap<String, IssuerConfig>) -> Result<Self, String> {
        if entries.is_empty() {
            return Err("at least one issuer must be configured".to_string());
        }

        let mut seen_urls: HashMap<&str, &str> = HashMap::new();
        for (key, issuer) in &entries {
            if issuer.issuer_url.is_empty() {
                return Err(format!("issuer '{key}' has an empty issuer_url"));
            }
            if issuer.audience.is_empty() {
                return Err(format!("issuer '{key}' has an empty audience"));
            }
            if let Some(other) = seen_urls.insert(issuer.issuer_url.as_str(), key.as_str()) {
                return Err(format!(
                    "issuers '{other}' and '{key}' share the issuer_url '{}'",
                    issuer.issuer_url
                ));
            }
        }

        Ok(Self { entries })
    }

    /// Look up an issuer by its configured key.
    pub fn get(&self, key: &str) -> Option<&IssuerConfig> {
        self.entries.get(key)
    }

    /// Look up an issuer by exact `iss` claim value.
    ///
    /// Returns the issuer key together with its configuration.
    pub fn by_issuer_url(&self, iss: &str) -> Option<(&str, &IssuerConfig)> {
        self.entries
            .iter()
            .find(|(_, issuer)| issuer.issuer_url == iss)
            .map(|(key, issuer)| (key.as_str(), issuer))
    }

    /// Number of configured issuers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty (never true for a constructed table).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
