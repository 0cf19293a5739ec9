//! Redis-backed key-value store.
//!
//! # Connection Pattern
//!
//! The redis-rs `MultiplexedConnection` is designed to be cloned cheaply and
//! used concurrently. From the docs: "cheap to clone and can be used safely
//! concurrently". No locking is needed - just clone the connection for each
//! operation.

use crate::cache::{KeyValueStore, StoreError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{error, warn};

/// Redis implementation of [`KeyValueStore`].
///
/// Cheaply cloneable; the underlying multiplexed connection is shared.
#[derive(Clone)]
pub struct RedisStore {
    /// Redis client (kept for potential reconnection scenarios).
    #[allow(dead_code)]
    client: Client,
    /// Multiplexed connection (cheaply cloneable, designed for concurrent use).
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the client cannot be created or
    /// the connection cannot be established.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(|e| {
            // Do NOT log redis_url as it may contain credentials
            // (e.g., redis://:password@host:port)
            error!(
                target: "tv.cache.redis",
                error = %e,
                "Failed to open Redis client"
            );
            StoreError::Connection(format!("Failed to open Redis client: {e}"))
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(
                    target: "tv.cache.redis",
                    error = %e,
                    "Failed to connect to Redis"
                );
                StoreError::Connection(format!("Failed to connect to Redis: {e}"))
            })?;

        Ok(Self { client, connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        // Clone the connection (cheap operation) for this request
        let mut conn = self.connection.clone();

        let result: Option<String> = conn.get(key).await.map_err(|e| {
            warn!(
                target: "tv.cache.redis",
                error = %e,
                key = %key,
                "Failed to read key"
            );
            StoreError::Operation(format!("Failed to read key: {e}"))
        })?;

        Ok(result)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();

        // SET with EX - a TTL of zero is invalid in Redis, floor at one second
        let ttl_secs = ttl.as_secs().max(1);

        let _: () = conn.set_ex(key, value, ttl_secs).await.map_err(|e| {
            warn!(
                target: "tv.cache.redis",
                error = %e,
                key = %key,
                "Failed to write key"
            );
            StoreError::Operation(format!("Failed to write key: {e}"))
        })?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                warn!(target: "tv.cache.redis", error = %e, "PING failed");
                StoreError::Operation(format!("PING failed: {e}"))
            })?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Operation(format!(
                "unexpected PING reply: {pong}"
            )))
        }
    }
}
