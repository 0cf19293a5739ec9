//! HTTP request handlers for the Token Verifier.

pub mod health;
pub mod verify;

pub use health::{liveness, readiness};
pub use verify::verify_token;
