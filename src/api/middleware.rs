//! API middleware
//!
//! Contains:
//! - `AppState` with the shared services
//! - `ApiError`, the wire form of every failure
//! - Authentication (JWT bearer validation) and admin authorization
//!   middleware
//!
//! Two error body shapes exist on the wire: domain failures are
//! `{"error": "<message>"}`, authentication/authorization failures are
//! `{"detail": "<message>"}`.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::repositories::{
    SqlxBookingRepository, SqlxMovieRepository, SqlxShowRepository, SqlxUserRepository,
    UserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{User, UserRole};
use crate::services::{
    BookingError, BookingService, MovieService, MovieServiceError, TokenService, UserService,
    UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub movie_service: Arc<MovieService>,
    pub booking_service: Arc<BookingService>,
    pub user_repo: Arc<dyn UserRepository>,
    pub token_service: TokenService,
}

impl AppState {
    /// Wire up all repositories and services over one pool
    pub fn new(pool: DynDatabasePool, auth: &AuthConfig) -> Self {
        let token_service = TokenService::new(
            &auth.jwt_secret,
            auth.access_token_ttl_seconds,
            auth.refresh_token_ttl_seconds,
        );

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let movie_repo = SqlxMovieRepository::boxed(pool.clone());
        let show_repo = SqlxShowRepository::boxed(pool.clone());
        let booking_repo = SqlxBookingRepository::boxed(pool.clone());

        Self {
            user_service: Arc::new(UserService::new(user_repo.clone(), token_service.clone())),
            movie_service: Arc::new(MovieService::new(movie_repo, show_repo.clone())),
            booking_service: Arc::new(BookingService::new(show_repo, booking_repo)),
            user_repo,
            token_service,
            pool,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Classified API error, mapped to an HTTP status and a wire body
#[derive(Debug)]
pub enum ApiError {
    /// 404, `{"error": ...}`
    NotFound(String),
    /// 400, `{"error": ...}`
    Validation(String),
    /// 400, `{"error": ...}`
    InvalidOperation(String),
    /// 409, `{"error": ...}`
    Conflict(String),
    /// 401, `{"detail": ...}`
    Unauthorized(String),
    /// 403, `{"detail": ...}`
    Forbidden(String),
    /// 500, `{"error": ...}`, message not exposed
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Validation(msg) | ApiError::InvalidOperation(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "detail": msg })),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "detail": msg })),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(msg) => ApiError::NotFound(msg),
            BookingError::Validation(msg) => ApiError::Validation(msg),
            BookingError::InvalidOperation(msg) => ApiError::InvalidOperation(msg),
            BookingError::Conflict(msg) => ApiError::Conflict(msg),
            BookingError::Internal(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<MovieServiceError> for ApiError {
    fn from(err: MovieServiceError) -> Self {
        match err {
            MovieServiceError::NotFound(msg) => ApiError::NotFound(msg),
            MovieServiceError::Validation(msg) => ApiError::Validation(msg),
            MovieServiceError::Conflict(msg) => ApiError::Conflict(msg),
            MovieServiceError::Internal(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(msg) => ApiError::Validation(msg),
            UserServiceError::AuthenticationFailed(msg) => ApiError::Unauthorized(msg),
            UserServiceError::Internal(err) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Authentication middleware.
///
/// Validates the access token and loads the user, so handlers receive a
/// fully-resolved identity rather than raw claims.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;

    let claims = state
        .token_service
        .decode_access(&token)
        .map_err(|err| ApiError::Unauthorized(err.to_string()))?;

    let user = state
        .user_repo
        .get_by_id(claims.sub)
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to load user: {}", err)))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware, layered inside `require_auth`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    if user.0.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    Ok(next.run(request).await)
}
