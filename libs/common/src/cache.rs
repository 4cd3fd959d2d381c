//! Redis access for refresh sessions and the token revocation list
//!
//! Every key is namespaced with the configured prefix, so several deployments
//! can share one Redis database.

use std::time::Duration;

use anyhow::Result;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

const DEFAULT_KEY_PREFIX: &str = "shutterbook";

#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// e.g. "redis://localhost:6379"
    pub url: String,
    pub key_prefix: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// # Environment Variables
    /// - `REDIS_URL` (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX` (default: "shutterbook")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix = std::env::var("REDIS_KEY_PREFIX")
            .ok()
            .map(|p| p.trim().trim_end_matches(':').to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());

        Ok(RedisConfig { url, key_prefix })
    }
}

/// Shared Redis handle
///
/// Cheap to clone. Each call opens a multiplexed connection from the client,
/// so a Redis restart never leaves the services holding a dead socket.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    key_prefix: String,
}

impl RedisPool {
    /// No connection is made until first use.
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!(
            "Redis client initialized with URL: {} (prefix {})",
            config.url, config.key_prefix
        );
        Ok(RedisPool {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Store `value` under `key` for `ttl`
    ///
    /// A zero TTL would already be expired, so nothing is written.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(self.key(key), value, seconds).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.get(self.key(key)).await?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        Ok(conn.exists(self.key(key)).await?)
    }

    /// Delete a key, returning whether it existed
    ///
    /// When two callers race on the same key exactly one of them sees `true`.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(self.key(key)).await?;
        Ok(removed > 0)
    }

    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
