//! Admin endpoints
//!
//! Catalog management and booking statistics. The router layers
//! `require_admin` over these, so handlers can assume an admin caller.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::middleware::{ApiError, AppState};
use crate::models::{CreateMovieInput, CreateShowInput};

/// Default stats window in days
const DEFAULT_STATS_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub days: Option<i64>,
}

/// POST /api/admin/movies/
pub async fn create_movie(
    State(state): State<AppState>,
    Json(payload): Json<CreateMovieInput>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = state.movie_service.create_movie(payload).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// POST /api/admin/shows/
pub async fn create_show(
    State(state): State<AppState>,
    Json(payload): Json<CreateShowInput>,
) -> Result<impl IntoResponse, ApiError> {
    let show = state.movie_service.create_show(payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(show)))
}

/// GET /api/admin/stats/
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_STATS_WINDOW_DAYS);
    if days < 1 {
        return Err(ApiError::Validation(
            "Stats window must be at least 1 day".to_string(),
        ));
    }

    let report = state.booking_service.booking_stats(days, Utc::now()).await?;
    Ok(Json(report))
}
