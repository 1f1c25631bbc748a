//! Booking endpoints
//!
//! Thin HTTP adapters over the booking service: the authenticated identity
//! from the request extension and the current time are passed explicitly
//! into every call.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::middleware::{ApiError, AppState, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct BookSeatRequest {
    pub seat_number: i64,
}

/// POST /api/shows/{show_id}/book/
pub async fn book_seat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(show_id): Path<i64>,
    Json(payload): Json<BookSeatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .booking_service
        .book_seat(user.0.id, show_id, payload.seat_number, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/my-bookings/
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.booking_service.list_my_bookings(user.0.id).await?;
    Ok(Json(bookings))
}

/// POST /api/bookings/{booking_id}/cancel/
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .booking_service
        .cancel_booking(user.0.id, booking_id, Utc::now())
        .await?;

    Ok(Json(booking))
}
