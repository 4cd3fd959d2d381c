//! Custom error types for the API service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{auth::AuthRejection, error::DatabaseError, response};
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Caller lacks the role or ownership required
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource or a state change that no longer applies
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Rejected(#[from] AuthRejection),

    /// Database error
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Internal server error
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Rejected(rejection) => return rejection.into_response(),
            ApiError::Database(DatabaseError::Conflict { .. }) => (
                StatusCode::CONFLICT,
                "Resource already exists".to_string(),
            ),
            ApiError::Database(DatabaseError::NotFound) => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        response::error(status, message)
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
