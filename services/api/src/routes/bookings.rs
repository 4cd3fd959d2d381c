//! Booking requests and the status workflow

use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use common::{
    auth::{AuthUser, auth_middleware},
    response::ApiResponse,
    validation::{PathParams, ValidatedJson},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        Booking, BookingActor, BookingStatus, CreateBookingRequest, UpdateBookingStatusRequest,
    },
    repositories::booking::NewBooking,
    routes::require_profile,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/my-bookings", get(my_bookings))
        .route("/photographer", get(photographer_bookings))
        .route("/:id/status", patch(update_status))
        .route("/:id", delete(cancel_booking))
        .route_layer(from_fn_with_state(
            state.authenticator.clone(),
            auth_middleware,
        ))
}

fn booking_not_found() -> ApiError {
    ApiError::NotFound("Booking not found".to_string())
}

/// Request a booking with a photographer
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let photographer = state
        .photographers
        .find_by_id(payload.photographer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photographer not found".to_string()))?;

    if photographer.user_id == user.id {
        return Err(ApiError::BadRequest("You cannot book yourself".to_string()));
    }

    let booking = state
        .bookings
        .create(
            user.id,
            &NewBooking {
                photographer_id: photographer.id,
                event_date: payload.event_date,
                message: payload.normalized_message(),
            },
        )
        .await?;

    Ok(ApiResponse::created(
        booking,
        "Booking request sent successfully",
    ))
}

/// Bookings the caller made as a client
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.bookings.list_for_client(user.id).await?;
    Ok(ApiResponse::ok(bookings, "Bookings retrieved successfully"))
}

/// Requests received by the caller's photographer profile
pub async fn photographer_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let profile = require_profile(&state, &user).await?;
    let bookings = state.bookings.list_for_photographer(profile.id).await?;
    Ok(ApiResponse::ok(bookings, "Bookings retrieved successfully"))
}

/// Load a booking and work out which side the caller is on
///
/// Callers on neither side get 404 so booking ids do not leak.
async fn load_for_actor(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> ApiResult<(Booking, BookingActor)> {
    let (booking, owner_id) = state
        .bookings
        .find_with_owner(id)
        .await?
        .ok_or_else(booking_not_found)?;

    let actor = if owner_id == user.id {
        BookingActor::Photographer
    } else if booking.client_id == user.id {
        BookingActor::Client
    } else {
        return Err(booking_not_found());
    };

    Ok((booking, actor))
}

/// Apply a transition, conditional on the status that was read
async fn transition(
    state: &AppState,
    booking: Booking,
    actor: BookingActor,
    next: BookingStatus,
) -> ApiResult<Booking> {
    if !booking.status.can_transition(next, actor) {
        return Err(ApiError::Conflict(format!(
            "Cannot change booking status from {} to {}",
            booking.status, next
        )));
    }

    state
        .bookings
        .update_status(booking.id, booking.status, next)
        .await?
        .ok_or_else(|| {
            warn!("Booking {} changed concurrently", booking.id);
            ApiError::Conflict("Booking status has changed, please reload".to_string())
        })
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateBookingStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let (booking, actor) = load_for_actor(&state, &user, id).await?;
    let booking = transition(&state, booking, actor, payload.status).await?;

    info!("Booking {} is now {}", booking.id, booking.status);

    Ok(ApiResponse::ok(booking, "Booking status updated successfully"))
}

/// Client-side cancellation
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (booking, actor) = load_for_actor(&state, &user, id).await?;
    if actor != BookingActor::Client {
        return Err(ApiError::Forbidden(
            "Only the client can cancel a booking".to_string(),
        ));
    }

    let booking = transition(&state, booking, actor, BookingStatus::Cancelled).await?;
    Ok(ApiResponse::ok(booking, "Booking cancelled successfully"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn booking_routes_require_authentication() {
        for (method, uri) in [
            ("POST", "/api/v1/bookings"),
            ("GET", "/api/v1/bookings/my-bookings"),
            ("GET", "/api/v1/bookings/photographer"),
            (
                "PATCH",
                "/api/v1/bookings/6f1c2a9e-8a55-4f8e-9a57-0a2b1f7d3c11/status",
            ),
            (
                "DELETE",
                "/api/v1/bookings/6f1c2a9e-8a55-4f8e-9a57-0a2b1f7d3c11",
            ),
        ] {
            let response = router()
                .oneshot(json_request(method, uri, "{}"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }
}
