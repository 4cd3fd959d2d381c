//! Shared handler state

use common::{auth::Authenticator, cache::RedisPool, jwt::JwtService};
use sqlx::PgPool;

use crate::{
    cookies::CookieConfig, rate_limiter::RateLimiter, repositories::UserRepository,
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub authenticator: Authenticator,
    pub user_repository: UserRepository,
    pub sessions: SessionManager,
    pub rate_limiter: RateLimiter,
    pub cookies: CookieConfig,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        redis_pool: RedisPool,
        jwt_service: JwtService,
        rate_limiter: RateLimiter,
        cookies: CookieConfig,
    ) -> Self {
        Self {
            user_repository: UserRepository::new(db_pool.clone()),
            sessions: SessionManager::new(redis_pool.clone()),
            authenticator: Authenticator::new(jwt_service, redis_pool),
            db_pool,
            rate_limiter,
            cookies,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        self.authenticator.jwt_service()
    }
}
