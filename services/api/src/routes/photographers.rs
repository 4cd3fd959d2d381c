//! Photographer onboarding, profile management and the public directory

use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use common::{
    auth::{AuthUser, auth_middleware},
    error::DatabaseError,
    response::{ApiResponse, PageParams, Pagination},
    validation::{PathParams, QueryParams, ValidatedJson},
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        BrowseQuery, BrowseResponse, CreatePhotographerRequest, UpdatePhotographerRequest,
        photographer::normalize_specialties,
    },
    repositories::photographer::{NewPhotographer, USER_CONSTRAINT, USERNAME_CONSTRAINT},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 50;

pub fn router(state: &AppState) -> Router<AppState> {
    let auth = from_fn_with_state(state.authenticator.clone(), auth_middleware);

    Router::new()
        .route("/", post(onboard).route_layer(auth.clone()))
        .route("/browse", get(browse))
        .route(
            "/profile",
            get(own_profile).put(update_profile).route_layer(auth),
        )
        .route("/:id_or_username", get(public_profile))
}

/// Create the caller's photographer profile
pub async fn onboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreatePhotographerRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Onboarding photographer for user: {}", user.id);

    if state.photographers.find_by_user_id(user.id).await?.is_some() {
        return Err(ApiError::Conflict(
            "Photographer profile already exists".to_string(),
        ));
    }

    let new = NewPhotographer {
        username: payload.normalized_username(),
        bio: payload.normalized_bio(),
        location: payload.location.trim().to_string(),
        specialties: normalize_specialties(&payload.specialties),
        price_from: payload.price_from,
    };

    let photographer = state
        .photographers
        .create(user.id, &new)
        .await
        .map_err(|e| {
            if e.is_conflict_on(USERNAME_CONSTRAINT) {
                ApiError::Conflict("Username is already taken".to_string())
            } else if e.is_conflict_on(USER_CONSTRAINT) {
                ApiError::Conflict("Photographer profile already exists".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(ApiResponse::created(
        photographer,
        "Photographer profile created successfully",
    ))
}

/// Public, paginated directory
pub async fn browse(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BrowseQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.filter().map_err(ApiError::BadRequest)?;
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .clamp(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    let (photographers, total) = state
        .photographers
        .browse(&filter, limit, PageParams::offset(page, limit))
        .await?;

    Ok(ApiResponse::ok(
        BrowseResponse {
            photographers,
            pagination: Pagination::new(page, limit, total),
        },
        "Photographers retrieved successfully",
    ))
}

/// The caller's own profile
pub async fn own_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let photographer = state
        .photographers
        .find_by_user_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photographer profile not found".to_string()))?;

    Ok(ApiResponse::ok(photographer, "Profile retrieved successfully"))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdatePhotographerRequest>,
) -> ApiResult<impl IntoResponse> {
    let update = payload.into_update();
    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide at least one field to update".to_string(),
        ));
    }

    let photographer = state
        .photographers
        .update(user.id, &update)
        .await
        .map_err(|e| match e {
            DatabaseError::NotFound => {
                ApiError::NotFound("Photographer profile not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(ApiResponse::ok(photographer, "Profile updated successfully"))
}

/// Public profile by ID or username
pub async fn public_profile(
    State(state): State<AppState>,
    PathParams(id_or_username): PathParams<String>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .photographers
        .find_public(&id_or_username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photographer not found".to_string()))?;

    Ok(ApiResponse::ok(profile, "Photographer retrieved successfully"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use tower::ServiceExt;

    #[tokio::test]
    async fn browse_rejects_inverted_price_range() {
        let response = router()
            .oneshot(empty_request(
                "GET",
                "/api/v1/photographers/browse?minPrice=300&maxPrice=100",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "minPrice cannot be greater than maxPrice");
    }

    #[tokio::test]
    async fn browse_rejects_non_numeric_price_with_envelope() {
        let response = router()
            .oneshot(empty_request(
                "GET",
                "/api/v1/photographers/browse?minPrice=cheap",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("query string"));
    }

    #[tokio::test]
    async fn onboarding_requires_authentication() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/v1/photographers",
                r#"{"username":"jane","location":"Lisbon","specialties":["wedding"]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn own_profile_rejects_refresh_token() {
        let mut request = empty_request("GET", "/api/v1/photographers/profile");
        request.headers_mut().insert(
            AUTHORIZATION,
            format!("Bearer {}", refresh_token()).parse().unwrap(),
        );

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
