//! Redis cache module
//!
//! Thin wrapper over a multiplexed Redis connection used for short-lived,
//! TTL-bound records such as login sessions. Every key is namespaced with a
//! configurable prefix so several deployments can share one Redis instance.

use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

use crate::error::DatabaseResult;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key
    pub key_prefix: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX`: Key namespace (default: "qr")
    pub fn from_env() -> Self {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix = std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "qr".to_string());

        RedisConfig { url, key_prefix }
    }
}

/// Shared Redis connection
///
/// Cloning is cheap: clones share the same multiplexed connection.
#[derive(Clone)]
pub struct RedisPool {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisPool {
    /// Connect to Redis
    pub async fn new(config: &RedisConfig) -> DatabaseResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis connection established");
        Ok(RedisPool {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    /// Set a key that expires after `ttl_seconds`
    pub async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> DatabaseResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(self.key(key), value, ttl_seconds.max(1)).await?;
        Ok(())
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> DatabaseResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    /// Delete a key, returning whether it existed
    pub async fn delete(&self, key: &str) -> DatabaseResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(self.key(key)).await?;
        Ok(removed > 0)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> DatabaseResult<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
