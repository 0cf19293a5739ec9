//! Observability for the Token Verifier.

pub mod metrics;
