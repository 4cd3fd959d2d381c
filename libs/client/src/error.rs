//! Errors surfaced to client callers

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connection refused, timeout, TLS
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a failure envelope
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },

    /// The refresh token was rejected; the user has to log in again
    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            ClientError::Http(e) => e.status(),
            ClientError::Decode(_) => None,
        }
    }
}
