//! Portfolio management

use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post},
};
use common::{
    auth::{AuthUser, auth_middleware},
    response::{self, ApiResponse},
    validation::{PathParams, ValidatedJson},
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::CreatePortfolioItemRequest,
    repositories::portfolio::NewPortfolioItem,
    routes::require_profile,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let auth = from_fn_with_state(state.authenticator.clone(), auth_middleware);

    Router::new()
        .route("/", post(add_item).get(my_items).route_layer(auth.clone()))
        // GET reads the segment as a username, DELETE as an item id
        .route(
            "/:key",
            get(public_items).merge(delete(delete_item).route_layer(auth)),
        )
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreatePortfolioItemRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = require_profile(&state, &user).await?;

    let item = state
        .portfolio
        .create(
            profile.id,
            &NewPortfolioItem {
                media_url: payload.media_url.trim().to_string(),
                media_type: payload.media_type,
                category: payload.normalized_category(),
            },
        )
        .await?;

    Ok(ApiResponse::created(item, "Portfolio item added successfully"))
}

/// The caller's own items
pub async fn my_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let profile = require_profile(&state, &user).await?;
    let items = state.portfolio.list_for_photographer(profile.id).await?;
    Ok(ApiResponse::ok(items, "Portfolio retrieved successfully"))
}

/// A photographer's public items
pub async fn public_items(
    State(state): State<AppState>,
    PathParams(username): PathParams<String>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .photographers
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photographer not found".to_string()))?;

    let items = state.portfolio.list_for_photographer(profile.id).await?;
    Ok(ApiResponse::ok(items, "Portfolio retrieved successfully"))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let profile = require_profile(&state, &user).await?;

    if !state.portfolio.delete(id, profile.id).await? {
        return Err(ApiError::NotFound("Portfolio item not found".to_string()));
    }

    Ok(response::message("Portfolio item deleted successfully"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn own_portfolio_requires_authentication() {
        for method in ["GET", "POST"] {
            let response = router()
                .oneshot(json_request(
                    method,
                    "/api/v1/portfolio",
                    r#"{"mediaUrl":"https://cdn.example.com/a.jpg","mediaType":"image"}"#,
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn delete_requires_authentication() {
        let response = router()
            .oneshot(empty_request(
                "DELETE",
                "/api/v1/portfolio/6f1c2a9e-8a55-4f8e-9a57-0a2b1f7d3c11",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
