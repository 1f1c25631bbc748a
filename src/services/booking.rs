//! Booking service
//!
//! The core of the system: enforces every booking/cancellation rule and
//! reports a classified failure for each one. Checks run in a fixed order so
//! a request failing several rules always gets the same answer.
//!
//! The seat race (two concurrent requests for the same seat of the same
//! show) is decided by the storage layer: the pre-insert check catches the
//! common case cheaply, and the unique constraint on active (show, seat)
//! rows rejects the loser of a true race, which this service reports as
//! `Conflict` exactly like a failed pre-check.

use crate::db::repositories::{BookingRepository, CreateOutcome, ShowRepository, TopMovie};
use crate::models::{Booking, NewBooking};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Maximum simultaneous booked seats per user per show
pub const MAX_SEATS_PER_USER_PER_SHOW: i64 = 5;

/// How many movies the stats report ranks
const TOP_MOVIES_LIMIT: i64 = 5;

/// Error kinds produced by booking operations.
///
/// The API boundary maps these to HTTP statuses; the messages here are the
/// wire messages.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Referenced show/booking absent, or booking not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Malformed seat number or seat-limit exceeded
    #[error("{0}")]
    Validation(String),

    /// Booking a past/closed show, cancelling too late or twice
    #[error("{0}")]
    InvalidOperation(String),

    /// Seat race lost
    #[error("{0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Seat occupancy for one show
#[derive(Debug, Clone, Serialize)]
pub struct SeatAvailability {
    pub total_seats: i64,
    pub booked_seats: Vec<i64>,
    pub available_seats: i64,
}

/// Aggregate booking numbers over a time window (admin)
#[derive(Debug, Clone, Serialize)]
pub struct BookingStatsReport {
    pub window_days: i64,
    pub total_bookings: i64,
    pub active_bookings: i64,
    pub cancelled_bookings: i64,
    pub cancellation_rate: f64,
    pub top_movies: Vec<TopMovieEntry>,
}

/// One row of the top-movies ranking
#[derive(Debug, Clone, Serialize)]
pub struct TopMovieEntry {
    pub movie_id: i64,
    pub title: String,
    pub booking_count: i64,
}

impl From<TopMovie> for TopMovieEntry {
    fn from(m: TopMovie) -> Self {
        Self {
            movie_id: m.movie_id,
            title: m.title,
            booking_count: m.booking_count,
        }
    }
}

/// Booking service enforcing seat and time-window rules
pub struct BookingService {
    show_repo: Arc<dyn ShowRepository>,
    booking_repo: Arc<dyn BookingRepository>,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        show_repo: Arc<dyn ShowRepository>,
        booking_repo: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            show_repo,
            booking_repo,
        }
    }

    /// Book a seat on a show for a user.
    ///
    /// Preconditions are checked in a fixed order, each with its own failure:
    /// show exists, show is in the future, show is active, booking window
    /// still open, seat number in range, seat free, user under the per-show
    /// cap. The insert itself still races through the storage uniqueness
    /// constraint; losing that race is a `Conflict` too.
    pub async fn book_seat(
        &self,
        user_id: i64,
        show_id: i64,
        seat_number: i64,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let show = self
            .show_repo
            .get_by_id(show_id)
            .await
            .context("Failed to load show")?
            .ok_or_else(|| BookingError::NotFound("Show not found".to_string()))?;

        if !show.is_future(now) {
            return Err(BookingError::InvalidOperation(
                "Cannot book past show".to_string(),
            ));
        }

        if !show.is_active {
            return Err(BookingError::InvalidOperation(
                "Show is not active".to_string(),
            ));
        }

        if now >= show.booking_deadline() {
            return Err(BookingError::InvalidOperation(
                "Booking closed 30 minutes before show time".to_string(),
            ));
        }

        if !show.seat_in_range(seat_number) {
            return Err(BookingError::Validation(
                "Seat number must be valid".to_string(),
            ));
        }

        if self
            .booking_repo
            .find_active_by_show_seat(show_id, seat_number)
            .await
            .context("Failed to check seat")?
            .is_some()
        {
            return Err(BookingError::Conflict("Seat already booked".to_string()));
        }

        let active = self
            .booking_repo
            .count_active_for_user_show(user_id, show_id)
            .await
            .context("Failed to count user bookings")?;
        if active >= MAX_SEATS_PER_USER_PER_SHOW {
            return Err(BookingError::Validation("Seat limit exceeded".to_string()));
        }

        let new = NewBooking {
            user_id,
            show_id,
            seat_number,
            booking_reference: Booking::generate_reference(),
        };

        match self
            .booking_repo
            .create(&new)
            .await
            .context("Failed to create booking")?
        {
            CreateOutcome::Created(booking) => {
                tracing::info!(
                    booking_id = booking.id,
                    user_id,
                    show_id,
                    seat_number,
                    reference = %booking.booking_reference,
                    "Seat booked"
                );
                Ok(booking)
            }
            CreateOutcome::SeatTaken => {
                tracing::debug!(show_id, seat_number, "Seat race lost");
                Err(BookingError::Conflict("Seat already booked".to_string()))
            }
        }
    }

    /// Cancel a booking owned by the user.
    ///
    /// A booking the caller does not own is reported exactly like a missing
    /// one.
    pub async fn cancel_booking(
        &self,
        user_id: i64,
        booking_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .booking_repo
            .get_by_id(booking_id)
            .await
            .context("Failed to load booking")?
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;

        if !booking.is_active() {
            return Err(BookingError::InvalidOperation(
                "Already cancelled".to_string(),
            ));
        }

        let show = self
            .show_repo
            .get_by_id(booking.show_id)
            .await
            .context("Failed to load show")?
            .ok_or_else(|| anyhow::anyhow!("Booking {} references missing show", booking.id))
            .map_err(BookingError::Internal)?;

        if !show.is_cancellable_at(now) {
            return Err(BookingError::InvalidOperation(
                "Cannot cancel within 2 hours of showtime".to_string(),
            ));
        }

        self.booking_repo
            .cancel(booking.id, now)
            .await
            .context("Failed to cancel booking")?;

        tracing::info!(booking_id = booking.id, user_id, "Booking cancelled");

        let cancelled = self
            .booking_repo
            .get_by_id(booking.id)
            .await
            .context("Failed to reload booking")?
            .ok_or_else(|| anyhow::anyhow!("Booking {} vanished after cancel", booking.id))
            .map_err(BookingError::Internal)?;

        Ok(cancelled)
    }

    /// All bookings of a user, any status, newest first
    pub async fn list_my_bookings(&self, user_id: i64) -> Result<Vec<Booking>, BookingError> {
        Ok(self
            .booking_repo
            .list_by_user(user_id)
            .await
            .context("Failed to list bookings")?)
    }

    /// Seat occupancy for a show
    pub async fn seat_availability(&self, show_id: i64) -> Result<SeatAvailability, BookingError> {
        let show = self
            .show_repo
            .get_by_id(show_id)
            .await
            .context("Failed to load show")?
            .ok_or_else(|| BookingError::NotFound("Show not found".to_string()))?;

        let booked_seats = self
            .booking_repo
            .booked_seat_numbers(show_id)
            .await
            .context("Failed to list booked seats")?;

        let available_seats = show.total_seats - booked_seats.len() as i64;

        Ok(SeatAvailability {
            total_seats: show.total_seats,
            booked_seats,
            available_seats,
        })
    }

    /// Booking counts and top movies over the last `window_days` days (admin)
    pub async fn booking_stats(
        &self,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<BookingStatsReport, BookingError> {
        let since = now - Duration::days(window_days);

        let stats = self
            .booking_repo
            .stats_since(since)
            .await
            .context("Failed to compute stats")?;

        let top_movies = self
            .booking_repo
            .top_movies_since(since, TOP_MOVIES_LIMIT)
            .await
            .context("Failed to rank movies")?
            .into_iter()
            .map(TopMovieEntry::from)
            .collect();

        let cancellation_rate = if stats.total > 0 {
            stats.cancelled as f64 / stats.total as f64
        } else {
            0.0
        };

        Ok(BookingStatsReport {
            window_days,
            total_bookings: stats.total,
            active_bookings: stats.active,
            cancelled_bookings: stats.cancelled,
            cancellation_rate,
            top_movies,
        })
    }
}
