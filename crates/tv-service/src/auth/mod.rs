//! Token verification.
//!
//! Parsing, issuer dispatch, JWKS resolution, and signature/claims
//! verification for externally-issued bearer tokens.

pub mod claims;
pub mod issuers;
pub mod jwks;
pub mod token;
pub mod verifier;

pub use claims::{Audience, Claims};
pub use issuers::{IssuerConfig, IssuerTable};
pub use jwks::{Jwk, JwksCache, JwksDocument};
pub use verifier::TokenVerifier;
