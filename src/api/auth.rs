//! Authentication endpoints
//!
//! Signup, login, and token refresh. All three are public; everything else
//! in the API sits behind `require_auth`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use super::middleware::{ApiError, AppState};
use super::responses::AccessTokenResponse;
use crate::models::CreateUserInput;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// POST /api/auth/signup/
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_service
        .register(CreateUserInput {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login/
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state
        .user_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(pair))
}

/// POST /api/auth/refresh/
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.user_service.refresh(&payload.refresh).await?;

    Ok(Json(AccessTokenResponse { access }))
}
