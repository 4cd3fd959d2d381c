//! Application state shared across handlers

use common::{auth::Authenticator, cache::RedisPool, jwt::JwtService};
use sqlx::PgPool;

use crate::repositories::{
    BookingRepository, PhotographerRepository, PortfolioRepository, ReviewRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub authenticator: Authenticator,
    pub photographers: PhotographerRepository,
    pub bookings: BookingRepository,
    pub portfolio: PortfolioRepository,
    pub reviews: ReviewRepository,
}

impl AppState {
    pub fn new(db_pool: PgPool, redis_pool: RedisPool, jwt_service: JwtService) -> Self {
        Self {
            authenticator: Authenticator::new(jwt_service, redis_pool),
            photographers: PhotographerRepository::new(db_pool.clone()),
            bookings: BookingRepository::new(db_pool.clone()),
            portfolio: PortfolioRepository::new(db_pool.clone()),
            reviews: ReviewRepository::new(db_pool.clone()),
            db_pool,
        }
    }
}
