use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        services::{authenticate, register_user, AuthUser, JwtKeys},
    },
    error::ApiError,
    extract::ValidJson,
    response::ApiResponse,
    state::AppState,
};

const PROVIDER_SECRET_HEADER: &str = "x-provider-secret";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, headers, payload))]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let provider_secret = headers
        .get(PROVIDER_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    let user = register_user(&state, payload, provider_secret).await?;
    let tokens = JwtKeys::from_ref(&state).issue(user)?;
    Ok(ApiResponse::created("User registered successfully.", tokens))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let user = authenticate(&state, payload).await?;
    let tokens = JwtKeys::from_ref(&state).issue(user)?;
    Ok(ApiResponse::ok("User logged in successfully.", tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RefreshRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token verification failed");
        ApiError::Unauthorized("Invalid refresh token".into())
    })?;

    // the account may have been removed since the token was issued
    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".into()))?;

    let tokens = keys.issue(user)?;
    Ok(ApiResponse::ok("Access Token generated successfully.", tokens))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<ApiResponse<PublicUser>, ApiError> {
    let user = state
        .store
        .find_user_by_id(caller.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not exists".into()))?;
    Ok(ApiResponse::ok("User retrieved successfully", user.into()))
}
