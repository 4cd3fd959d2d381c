//! Reviews of photographers

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
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateReviewRequest, ReviewListResponse},
    repositories::review::{NewReview, REVIEW_PAIR_CONSTRAINT},
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let auth = from_fn_with_state(state.authenticator.clone(), auth_middleware);

    Router::new()
        .route("/", post(create_review).route_layer(auth.clone()))
        // GET reads the segment as a username, DELETE as a review id
        .route(
            "/:key",
            get(list_reviews).merge(delete(delete_review).route_layer(auth)),
        )
}

/// Review a photographer after a completed booking
pub async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let photographer = state
        .photographers
        .find_by_id(payload.photographer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photographer not found".to_string()))?;

    if photographer.user_id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot review yourself".to_string(),
        ));
    }

    if !state
        .bookings
        .has_completed(user.id, photographer.id)
        .await?
    {
        return Err(ApiError::Forbidden(
            "You can only review photographers after a completed booking".to_string(),
        ));
    }

    let review = state
        .reviews
        .create(
            user.id,
            &NewReview {
                photographer_id: photographer.id,
                rating: payload.rating,
                comment: payload.normalized_comment(),
            },
        )
        .await
        .map_err(|e| {
            if e.is_conflict_on(REVIEW_PAIR_CONSTRAINT) {
                ApiError::Conflict("You have already reviewed this photographer".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(ApiResponse::created(review, "Review submitted successfully"))
}

/// Public reviews of a photographer with the rating summary
pub async fn list_reviews(
    State(state): State<AppState>,
    PathParams(username): PathParams<String>,
) -> ApiResult<impl IntoResponse> {
    let photographer = state
        .photographers
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photographer not found".to_string()))?;

    let reviews = state.reviews.list_for_photographer(photographer.id).await?;
    let (average, total) = state.reviews.summary(photographer.id).await?;

    Ok(ApiResponse::ok(
        ReviewListResponse::new(reviews, average, total),
        "Reviews retrieved successfully",
    ))
}

/// Remove a review; authors and administrators only
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let review = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    if review.user_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only delete your own reviews".to_string(),
        ));
    }

    if !state.reviews.delete(review.id).await? {
        return Err(ApiError::NotFound("Review not found".to_string()));
    }

    info!("Review {} deleted by {}", review.id, user.id);
    Ok(response::message("Review deleted successfully"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn posting_a_review_requires_authentication() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/v1/reviews",
                r#"{"photographerId":"6f1c2a9e-8a55-4f8e-9a57-0a2b1f7d3c11","rating":5}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deleting_a_review_requires_authentication() {
        let response = router()
            .oneshot(empty_request(
                "DELETE",
                "/api/v1/reviews/6f1c2a9e-8a55-4f8e-9a57-0a2b1f7d3c11",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
