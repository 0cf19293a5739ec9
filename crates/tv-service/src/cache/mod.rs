//! Shared key-value store capability.
//!
//! The JWKS cache lives in an external keyed store so that concurrent
//! instances observe a consistent cache. The store is injected as a trait
//! object; production uses Redis, tests and local development use the
//! in-memory implementation.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Keyed storage with expiration.
///
/// Writes always carry a TTL; entries disappear after it elapses. There is
/// no delete or locking surface - concurrent writers race and last write
/// wins, which callers must tolerate.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` on absent or expired keys.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value that expires after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
