//! API response types
//!
//! Wire shapes that differ from the raw models. Shows are enriched with
//! live seat occupancy and a bookability flag so clients need no second
//! request to render a showtime listing.

use crate::models::Show;
use crate::services::SeatAvailability;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A show together with its current seat occupancy
#[derive(Debug, Serialize)]
pub struct ShowResponse {
    pub id: i64,
    pub movie_id: i64,
    pub screen_name: String,
    pub date_time: DateTime<Utc>,
    pub total_seats: i64,
    pub price_cents: i64,
    pub is_active: bool,
    pub booked_seats: Vec<i64>,
    pub available_seats: i64,
    pub is_bookable: bool,
}

impl ShowResponse {
    pub fn from_parts(show: Show, availability: SeatAvailability, now: DateTime<Utc>) -> Self {
        let is_bookable = show.is_bookable_at(now) && availability.available_seats > 0;
        Self {
            id: show.id,
            movie_id: show.movie_id,
            screen_name: show.screen_name,
            date_time: show.date_time,
            total_seats: show.total_seats,
            price_cents: show.price_cents,
            is_active: show.is_active,
            booked_seats: availability.booked_seats,
            available_seats: availability.available_seats,
            is_bookable,
        }
    }
}

/// Token payload returned by `/api/auth/refresh/`
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
