//! Token Verifier (TV) Service Library
//!
//! This library provides the core functionality for the token-verification
//! edge service - a stateless HTTP API responsible for:
//!
//! - Bearer token verification against a federated set of identity providers
//! - JWKS fetching and caching through an external key-value store
//! - CORS policy enforcement for browser clients
//!
//! # Architecture
//!
//! The service is a straight-line validation pipeline:
//!
//! ```text
//! routes/mod.rs -> handlers/verify.rs -> auth/verifier.rs -> auth/jwks.rs -> cache/*
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `auth` - Token parsing, issuer dispatch, JWKS resolution, verification
//! - `cache` - Injected key-value store capability (Redis in production)
//! - `handlers` - HTTP request handlers
//! - `middleware` - CORS gate
//! - `models` - Request/response types
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod cache;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
