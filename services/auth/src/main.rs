use anyhow::Result;
use std::time::Duration;
use tracing::info;

mod cookies;
mod error;
mod middleware;
mod models;
mod password;
mod rate_limiter;
mod repositories;
mod routes;
mod session;
mod state;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    jwt::{JwtConfig, JwtService},
    server::{self, ServerConfig},
    telemetry,
};

use crate::{
    cookies::CookieConfig,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init("authentication service");

    let server_config = ServerConfig::from_env("AUTH", 3000)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    // Initialize JWT service
    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    // Initialize Redis client
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;

    let rate_limiter = RateLimiter::new(RateLimiterConfig::from_env());
    spawn_rate_limit_purge(rate_limiter.clone());

    let app_state = AppState::new(
        pool,
        redis_pool,
        jwt_service,
        rate_limiter,
        CookieConfig::from_env(),
    );

    info!("Authentication service initialized successfully");

    server::serve(
        routes::create_router(app_state),
        &server_config,
        "Authentication service",
    )
    .await
}

/// Drop expired rate limit windows once per window length
fn spawn_rate_limit_purge(rate_limiter: RateLimiter) {
    let period = rate_limiter.config().window.max(Duration::from_secs(60));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            rate_limiter.purge_expired().await;
        }
    });
}
