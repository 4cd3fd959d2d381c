use anyhow::Result;
use tracing::info;

mod error;
mod models;
mod repositories;
mod routes;
mod state;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    jwt::{JwtConfig, JwtService},
    server::{self, ServerConfig},
    telemetry,
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init("API service");

    let server_config = ServerConfig::from_env("API", 3001)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    // Tokens are only verified here; the signing key may be absent
    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;

    let app_state = AppState::new(pool, redis_pool, jwt_service);

    info!("API service initialized successfully");

    server::serve(routes::create_router(app_state), &server_config, "API service").await
}
