//! Show model
//!
//! A show is a scheduled screening of a movie on a screen at a specific
//! time, with a fixed seat capacity. Seats are numbered 1..=total_seats.
//! The time-window rules (booking cutoff, cancellation cutoff) live here as
//! pure helpers taking an explicit `now`, so services and tests control the
//! clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seat capacity bounds
pub const MIN_TOTAL_SEATS: i64 = 10;
pub const MAX_TOTAL_SEATS: i64 = 1000;

/// Bookings close this many minutes before show time
pub const BOOKING_CUTOFF_MINUTES: i64 = 30;

/// Cancellations close this many hours before show time
pub const CANCELLATION_CUTOFF_HOURS: i64 = 2;

/// Show entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    /// Unique identifier
    pub id: i64,
    /// Movie being screened
    pub movie_id: i64,
    /// Screen identifier
    pub screen_name: String,
    /// Scheduled start time (UTC)
    pub date_time: DateTime<Utc>,
    /// Fixed seat capacity; seats are numbered 1..=total_seats
    pub total_seats: i64,
    /// Ticket price in minor currency units
    pub price_cents: i64,
    /// Inactive shows are hidden from listings and cannot be booked
    pub is_active: bool,
}

impl Show {
    /// Whether the show starts strictly after `now`
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        self.date_time > now
    }

    /// Latest instant at which a seat can still be booked
    pub fn booking_deadline(&self) -> DateTime<Utc> {
        self.date_time - Duration::minutes(BOOKING_CUTOFF_MINUTES)
    }

    /// Latest instant at which a booking can still be cancelled
    pub fn cancellation_deadline(&self) -> DateTime<Utc> {
        self.date_time - Duration::hours(CANCELLATION_CUTOFF_HOURS)
    }

    /// Whether `seat_number` lies within 1..=total_seats
    pub fn seat_in_range(&self, seat_number: i64) -> bool {
        seat_number >= 1 && seat_number <= self.total_seats
    }

    /// Whether new bookings are accepted at `now`
    pub fn is_bookable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.booking_deadline()
    }

    /// Whether cancellations are accepted at `now`
    pub fn is_cancellable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.cancellation_deadline()
    }
}

/// Input for creating a show
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShowInput {
    pub movie_id: i64,
    pub screen_name: String,
    pub date_time: DateTime<Utc>,
    pub total_seats: i64,
    #[serde(default)]
    pub price_cents: i64,
}

impl CreateShowInput {
    /// Validate scheduling rules: non-blank screen, at least 1 hour of
    /// advance notice, 10..=1000 seats, non-negative price.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), String> {
        if self.screen_name.trim().is_empty() {
            return Err("Screen name cannot be empty".to_string());
        }
        if self.date_time <= now {
            return Err("Show date and time must be in the future".to_string());
        }
        if self.date_time < now + Duration::hours(1) {
            return Err("Show must be scheduled at least 1 hour in advance".to_string());
        }
        if self.total_seats < MIN_TOTAL_SEATS {
            return Err(format!("Show must have at least {} seats", MIN_TOTAL_SEATS));
        }
        if self.total_seats > MAX_TOTAL_SEATS {
            return Err(format!("Show cannot have more than {} seats", MAX_TOTAL_SEATS));
        }
        if self.price_cents < 0 {
            return Err("Price cannot be negative".to_string());
        }
        Ok(())
    }
}
