//! HTTP client for the Shutterbook API
//!
//! Sessions live in HttpOnly cookies, so the client keeps a cookie store and
//! never handles tokens itself. A request answered with 401 triggers one
//! session refresh shared by every request that failed at the same time,
//! after which each of them is replayed once.

pub mod error;
pub mod gate;
pub mod models;

use common::response::ApiResponse;
use reqwest::{Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

pub use error::ClientError;
pub use gate::RefreshGate;
pub use models::{ProfileUpdate, Registration, Session, User};

use models::Credentials;

pub type ClientResult<T> = Result<T, ClientError>;

/// Path of the refresh endpoint, relative to the base URL
pub const REFRESH_PATH: &str = "/users/refresh-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnUnauthorized {
    Refresh,
    Fail,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    gate: RefreshGate,
}

impl ApiClient {
    /// Client for `base_url`, e.g. `https://api.example.com/api/v1`
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self::with_http(http, base_url))
    }

    /// Reuse an existing reqwest client; it must keep cookies for sessions to work
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            gate: RefreshGate::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn refresh_gate(&self) -> &RefreshGate {
        &self.gate
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // Account endpoints. Bad credentials answer 401 too, so register and
    // login never go through the refresh gate.

    pub async fn register(&self, registration: &Registration) -> ClientResult<Session> {
        let body = serde_json::to_value(registration)?;
        self.send(
            Method::POST,
            "/users/register",
            Some(body),
            OnUnauthorized::Fail,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let body = serde_json::to_value(Credentials { email, password })?;
        self.send(Method::POST, "/users/login", Some(body), OnUnauthorized::Fail)
            .await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.send(Method::POST, "/users/logout", None, OnUnauthorized::Refresh)
            .await
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.get("/users/me").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        self.put("/users/profile", update).await
    }

    // Generic calls, all covered by the refresh gate

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::GET, path, None, OnUnauthorized::Refresh)
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::DELETE, path, None, OnUnauthorized::Refresh)
            .await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(method, path, Some(body), OnUnauthorized::Refresh)
            .await
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> ClientResult<Response> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        on_unauthorized: OnUnauthorized,
    ) -> ClientResult<T> {
        let observed = self.gate.generation();
        let response = self.dispatch(&method, path, body.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || on_unauthorized == OnUnauthorized::Fail
            || path == REFRESH_PATH
        {
            return read_envelope(response).await;
        }

        debug!("{} {} answered 401, refreshing the session", method, path);
        self.gate
            .refresh_after(observed, || self.refresh_session())
            .await?;

        // Replayed once; a second 401 goes back to the caller
        let response = self.dispatch(&method, path, body.as_ref()).await?;
        read_envelope(response).await
    }

    async fn refresh_session(&self) -> ClientResult<()> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        read_envelope::<Value>(response).await.map(|_| ())
    }
}

/// Unwrap the response envelope, or turn a failure envelope into an error
async fn read_envelope<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiResponse<Value>>(&body)
            .map(|envelope| envelope.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(ClientError::Api { status, message });
    }

    let envelope: ApiResponse<Value> = serde_json::from_slice(&body)?;
    Ok(serde_json::from_value(envelope.data.unwrap_or(Value::Null))?)
}
