//! Refresh-token sessions in Redis
//!
//! Each issued refresh token owns one key, `session:{user_id}:{jti}`, that
//! lives as long as the token. Refreshing consumes the key, so a refresh
//! token works exactly once.

use std::time::Duration;

use anyhow::Result;
use common::{cache::RedisPool, jwt::Claims};
use tracing::info;

/// Session manager for handling user sessions in Redis
#[derive(Clone)]
pub struct SessionManager {
    redis_pool: RedisPool,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    pub(crate) fn session_key(claims: &Claims) -> String {
        format!("session:{}:{}", claims.sub, claims.jti)
    }

    /// Record a freshly issued refresh token
    pub async fn create_session(&self, refresh_claims: &Claims) -> Result<()> {
        info!("Creating session for user: {}", refresh_claims.sub);

        self.redis_pool
            .set(
                &Self::session_key(refresh_claims),
                "1",
                Duration::from_secs(refresh_claims.remaining_lifetime()),
            )
            .await
    }

    /// Atomically use up a refresh token's session
    ///
    /// Returns false when the session is unknown: expired, logged out, or
    /// already rotated by an earlier refresh.
    pub async fn consume_session(&self, refresh_claims: &Claims) -> Result<bool> {
        self.redis_pool
            .delete(&Self::session_key(refresh_claims))
            .await
    }

    /// Drop a session on logout
    pub async fn delete_session(&self, refresh_claims: &Claims) -> Result<()> {
        info!("Deleting session for user: {}", refresh_claims.sub);

        self.redis_pool
            .delete(&Self::session_key(refresh_claims))
            .await
            .map(|_| ())
    }

    /// Get Redis health status
    pub async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}
