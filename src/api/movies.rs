//! Movie catalog endpoints

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use super::middleware::{ApiError, AppState};
use super::responses::ShowResponse;

/// GET /api/movies/
pub async fn list_movies(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let movies = state.movie_service.list_movies().await?;
    Ok(Json(movies))
}

/// GET /api/movies/{movie_id}/shows/
///
/// Upcoming active shows for a movie, each with live seat occupancy.
pub async fn movie_shows(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let shows = state.movie_service.shows_for_movie(movie_id, now).await?;

    let mut responses = Vec::with_capacity(shows.len());
    for show in shows {
        let availability = state.booking_service.seat_availability(show.id).await?;
        responses.push(ShowResponse::from_parts(show, availability, now));
    }

    Ok(Json(responses))
}
