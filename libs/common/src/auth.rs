//! Authentication middleware and role-based route protection
//!
//! Access tokens are accepted from the `Authorization: Bearer` header or from
//! the `accessToken` cookie. Revoked tokens are tracked in Redis by `jti`.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{cache::RedisPool, jwt::JwtService, response};

/// Name of the cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Name of the cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Photographer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Photographer => "photographer",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "photographer" => Ok(UserRole::Photographer),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Authenticated caller, stored in request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
    /// Id of the access token that authenticated this request
    pub jti: Uuid,
    /// Expiry of that access token (unix seconds)
    pub exp: u64,
}

impl AuthUser {
    /// Fail with `Forbidden` unless the caller holds one of the roles
    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), AuthRejection> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthRejection::Forbidden)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Why a request was not let through
#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token has been revoked")]
    Revoked,

    #[error("You do not have permission to access this resource")]
    Forbidden,

    #[error("Authentication backend unavailable")]
    Backend(#[source] anyhow::Error),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthRejection::MissingToken | AuthRejection::InvalidToken | AuthRejection::Revoked => {
                StatusCode::UNAUTHORIZED
            }
            AuthRejection::Forbidden => StatusCode::FORBIDDEN,
            AuthRejection::Backend(e) => {
                error!("Authentication backend failure: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        response::error(status, self.to_string())
    }
}

/// Extract the access token from the bearer header or the cookie jar
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Verifies access tokens and maintains the revocation list
#[derive(Clone)]
pub struct Authenticator {
    jwt_service: JwtService,
    redis_pool: RedisPool,
}

impl Authenticator {
    pub fn new(jwt_service: JwtService, redis_pool: RedisPool) -> Self {
        Self {
            jwt_service,
            redis_pool,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    fn revocation_key(jti: Uuid) -> String {
        format!("revoked_token:{}", jti)
    }

    /// Authenticate the request described by `headers`
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthRejection> {
        let token = extract_access_token(headers).ok_or(AuthRejection::MissingToken)?;

        let claims = self.jwt_service.validate_access_token(&token).map_err(|e| {
            warn!("Rejected access token: {}", e);
            AuthRejection::InvalidToken
        })?;

        if self.is_revoked(claims.jti).await? {
            return Err(AuthRejection::Revoked);
        }

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
            jti: claims.jti,
            exp: claims.exp,
        })
    }

    /// Whether the token with this id has been revoked
    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthRejection> {
        self.redis_pool
            .exists(&Self::revocation_key(jti))
            .await
            .map_err(AuthRejection::Backend)
    }

    /// Revoke the caller's access token for the rest of its lifetime
    pub async fn revoke(&self, user: &AuthUser) -> anyhow::Result<()> {
        // A token expiring this very second is still accepted, so keep at least 1s
        let remaining =
            crate::jwt::now_secs().map(|now| user.exp.saturating_sub(now).max(1))?;
        self.redis_pool
            .set(
                &Self::revocation_key(user.jti),
                "1",
                std::time::Duration::from_secs(remaining),
            )
            .await
    }
}

/// Require a valid access token and expose the caller as [`AuthUser`]
pub async fn auth_middleware(
    State(authenticator): State<Authenticator>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let user = authenticator.authenticate(req.headers()).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Only let administrators through. Must run after [`auth_middleware`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthRejection> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthRejection::MissingToken)?;

    user.require_role(&[UserRole::Admin])?;

    Ok(next.run(req).await)
}
