//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::CookieJar;
use common::{
    auth::{AuthUser, REFRESH_TOKEN_COOKIE, auth_middleware, require_admin},
    database,
    jwt::TokenPair,
    response::{self, ApiResponse, PageParams, Pagination},
    validation::{QueryParams, ValidatedJson},
};
use tracing::{info, warn};

use crate::{
    error::{AuthError, AuthResult},
    middleware::auth_rate_limit,
    models::{
        AuthPayload, LoginRequest, NewUser, RefreshTokenRequest, RegisterRequest,
        UpdateProfileRequest, User, UserListResponse,
    },
    password,
    repositories::user::{EMAIL_CONSTRAINT, PHONE_CONSTRAINT},
    state::AppState,
    validation::normalize_email,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let credentials = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(from_fn_with_state(state.clone(), auth_rate_limit));

    let admin = Router::new()
        .route("/", get(list_users))
        .route_layer(from_fn(require_admin));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(current_user))
        .route("/profile", put(update_profile))
        .merge(admin)
        .route_layer(from_fn_with_state(
            state.authenticator.clone(),
            auth_middleware,
        ));

    let users = Router::new()
        .route("/refresh-token", post(refresh_token))
        .route("/refresh", post(refresh_token))
        .merge(credentials)
        .merge(protected);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .nest("/api/v1/users", users)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Readiness: both backing stores answer
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);
    let redis = state.sessions.health_check().await.unwrap_or(false);

    let status = if database && redis {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "database": database,
            "redis": redis,
        })),
    )
}

/// Mint a token pair for `user` and record its refresh session
async fn start_session(state: &AppState, user: &User) -> AuthResult<TokenPair> {
    let pair = state.jwt_service().issue_pair(user.id, user.role)?;
    state.sessions.create_session(&pair.refresh_claims).await?;
    Ok(pair)
}

fn auth_payload(state: &AppState, user: User, pair: &TokenPair) -> AuthPayload {
    AuthPayload {
        user,
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service().access_token_expiry(),
    }
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    let role = payload
        .requested_role()
        .ok_or_else(|| AuthError::Forbidden("Cannot register as an administrator".to_string()))?;
    let email = normalize_email(&payload.email);

    info!("Registration attempt for: {}", email);

    if state.user_repository.find_by_email(&email).await?.is_some() {
        return Err(AuthError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password_blocking(payload.password).await?;

    let user = state
        .user_repository
        .create(&NewUser {
            email,
            full_name: payload.full_name.trim().to_string(),
            password_hash,
            role,
        })
        .await
        .map_err(|e| {
            if e.is_conflict_on(EMAIL_CONSTRAINT) {
                AuthError::Conflict("User with this email already exists".to_string())
            } else {
                e.into()
            }
        })?;

    let pair = start_session(&state, &user).await?;
    let jar = state.cookies.with_tokens(jar, &pair);

    info!("User registered: {}", user.id);

    Ok((
        jar,
        ApiResponse::created(
            auth_payload(&state, user, &pair),
            "User registered successfully",
        ),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    info!("Login attempt for: {}", email);

    let Some(user) = state.user_repository.find_by_email(&email).await? else {
        password::verify_against_dummy(payload.password).await?;
        return Err(AuthError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let valid =
        password::verify_password_blocking(payload.password, user.password_hash.clone()).await?;
    if !valid {
        warn!("Failed login for user: {}", user.id);
        return Err(AuthError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let pair = start_session(&state, &user).await?;
    let jar = state.cookies.with_tokens(jar, &pair);

    Ok((
        jar,
        ApiResponse::ok(auth_payload(&state, user, &pair), "Login successful"),
    ))
}

/// Refresh token endpoint
///
/// The presented refresh token is single use: its session is consumed before
/// a new pair is issued.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> AuthResult<impl IntoResponse> {
    let token = body
        .and_then(|Json(request)| request.refresh_token)
        .filter(|token| !token.is_empty())
        .or_else(|| {
            jar.get(REFRESH_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .filter(|token| !token.is_empty())
        })
        .ok_or_else(|| AuthError::Unauthorized("Refresh token required".to_string()))?;

    let claims = state
        .jwt_service()
        .validate_refresh_token(&token)
        .map_err(|e| {
            warn!("Rejected refresh token: {}", e);
            AuthError::Unauthorized("Invalid or expired refresh token".to_string())
        })?;

    if !state.sessions.consume_session(&claims).await? {
        warn!("Refresh token reuse or expired session for user: {}", claims.sub);
        return Err(AuthError::Unauthorized(
            "Session expired, please log in again".to_string(),
        ));
    }

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AuthError::Unauthorized("User no longer exists".to_string()))?;

    let pair = start_session(&state, &user).await?;
    let jar = state.cookies.with_tokens(jar, &pair);

    info!("Tokens refreshed for user: {}", user.id);

    Ok((
        jar,
        ApiResponse::ok(
            auth_payload(&state, user, &pair),
            "Token refreshed successfully",
        ),
    ))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse> {
    info!("Logout request for user: {}", user.id);

    state.authenticator.revoke(&user).await?;

    let refresh_claims = jar
        .get(REFRESH_TOKEN_COOKIE)
        .and_then(|cookie| {
            state
                .jwt_service()
                .validate_refresh_token(cookie.value())
                .ok()
        })
        .filter(|claims| claims.sub == user.id);

    if let Some(claims) = refresh_claims {
        state.sessions.delete_session(&claims).await?;
    }

    Ok((
        state.cookies.cleared(jar),
        response::message("Logged out successfully"),
    ))
}

/// Current user endpoint
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(user, "User retrieved successfully"))
}

/// Profile update endpoint
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AuthResult<impl IntoResponse> {
    let update = payload.into_update();
    if update.is_empty() {
        return Err(AuthError::BadRequest(
            "Provide at least one field to update".to_string(),
        ));
    }

    let user = state
        .user_repository
        .update(user.id, &update)
        .await
        .map_err(|e| {
            if e.is_conflict_on(PHONE_CONSTRAINT) {
                AuthError::Conflict("Phone number is already in use".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(ApiResponse::ok(user, "Profile updated successfully"))
}

/// Admin user listing
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<PageParams>,
) -> AuthResult<impl IntoResponse> {
    let (page, limit) = params.clamp(20, 100);
    let (users, total) = state
        .user_repository
        .list(limit, PageParams::offset(page, limit))
        .await?;

    Ok(ApiResponse::ok(
        UserListResponse {
            users,
            pagination: Pagination::new(page, limit, total),
        },
        "Users retrieved successfully",
    ))
}
