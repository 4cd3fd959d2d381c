//! Request input validation
//!
//! [`ValidatedJson`] deserializes a JSON body and runs the payload's
//! [`Validate`] rules before the handler is invoked. [`QueryParams`] and
//! [`PathParams`] wrap axum's extractors so malformed input is answered with
//! the JSON envelope instead of a plain-text 400.

use axum::{
    Json, async_trait,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use crate::response;

/// Field rules for a request payload
pub trait Validate {
    /// Return the first rule violation as a user facing message
    fn validate(&self) -> Result<(), String>;
}

/// JSON extractor that rejects payloads failing [`Validate`]
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// 400 response for malformed or invalid request bodies
#[derive(Debug)]
pub struct ValidationRejection(pub String);

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        response::error(StatusCode::BAD_REQUEST, self.0)
    }
}

impl From<JsonRejection> for ValidationRejection {
    fn from(rejection: JsonRejection) -> Self {
        ValidationRejection(rejection.body_text())
    }
}

impl From<QueryRejection> for ValidationRejection {
    fn from(rejection: QueryRejection) -> Self {
        ValidationRejection(rejection.body_text())
    }
}

impl From<PathRejection> for ValidationRejection {
    fn from(rejection: PathRejection) -> Self {
        ValidationRejection(rejection.body_text())
    }
}

/// Query string extractor with an enveloped rejection
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

/// Path segment extractor with an enveloped rejection
#[derive(Debug, Clone)]
pub struct PathParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(PathParams(value))
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate().map_err(ValidationRejection)?;
        Ok(ValidatedJson(value))
    }
}

/// `http(s)://` or `ftp://` URL without whitespace
pub fn is_url(value: &str) -> bool {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX
        .get_or_init(|| {
            Regex::new(r"^(https?|ftp)://[^\s/$.?#][^\s]*$").expect("Failed to compile URL regex")
        })
        .is_match(value)
}

/// Length check on the character count of an already trimmed value
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        if min == 1 {
            return Err(format!("{} is required", field));
        }
        return Err(format!("{} must be at least {} characters long", field, min));
    }
    if len > max {
        return Err(format!("{} cannot exceed {} characters", field, max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, header::CONTENT_TYPE},
        routing::{get, post},
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Search {
        min: Option<f64>,
    }

    #[derive(Deserialize)]
    struct Greeting {
        name: String,
    }

    impl Validate for Greeting {
        fn validate(&self) -> Result<(), String> {
            check_length("Name", self.name.trim(), 2, 10)
        }
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/greet",
                post(|ValidatedJson(g): ValidatedJson<Greeting>| async move { g.name }),
            )
            .route(
                "/items/:id",
                get(|PathParams(id): PathParams<Uuid>| async move { id.to_string() }),
            )
            .route(
                "/search",
                get(|QueryParams(q): QueryParams<Search>| async move {
                    q.min.unwrap_or_default().to_string()
                }),
            )
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(HttpRequest::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    async fn post_json(body: &str) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(
                HttpRequest::post("/greet")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn valid_payload_reaches_handler() {
        let (status, _) = post_json(r#"{"name":"Ada"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rule_violation_is_bad_request() {
        let (status, body) = post_json(r#"{"name":"A"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Name must be at least 2 characters long");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = post_json(r#"{"name":"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn bad_query_value_is_an_enveloped_bad_request() {
        let (status, body) = get_json("/search?min=cheap").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("query string"));

        let (status, _) = get_json("/search?min=12.5").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_path_segment_is_an_enveloped_bad_request() {
        let (status, body) = get_json("/items/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = get_json(&format!("/items/{}", Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn url_rule() {
        assert!(is_url("https://cdn.example.com/a.jpg"));
        assert!(is_url("ftp://files.example.com/x"));
        assert!(!is_url("javascript:alert(1)"));
        assert!(!is_url("https://has space.com"));
        assert!(!is_url(""));
    }

    #[test]
    fn length_rule_messages() {
        assert_eq!(
            check_length("Location", "", 1, 10).unwrap_err(),
            "Location is required"
        );
        assert_eq!(
            check_length("Bio", "abcdef", 0, 5).unwrap_err(),
            "Bio cannot exceed 5 characters"
        );
        assert!(check_length("Bio", "", 0, 5).is_ok());
    }
}
