//! API service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use common::{auth::AuthUser, database};
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    models::Photographer,
    state::AppState,
};

pub mod bookings;
pub mod photographers;
pub mod portfolio;
pub mod reviews;


/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/photographers", photographers::router(&state))
        .nest("/bookings", bookings::router(&state))
        .nest("/portfolio", portfolio::router(&state))
        .nest("/reviews", reviews::router(&state));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Readiness: the database answers
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(json!({ "database": database })))
}

/// The caller's photographer profile, required by photographer-only routes
pub(crate) async fn require_profile(state: &AppState, user: &AuthUser) -> ApiResult<Photographer> {
    state
        .photographers
        .find_by_user_id(user.id)
        .await?
        .ok_or_else(|| {
            ApiError::Forbidden("Complete your photographer profile first".to_string())
        })
}
