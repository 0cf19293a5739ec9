//! Middleware for the Token Verifier.

pub mod cors;
