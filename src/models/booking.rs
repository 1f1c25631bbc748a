//! Booking model
//!
//! A booking is a user's claim on one seat of one show. Bookings are never
//! deleted; cancelling flips the status and stamps `cancelled_at`. The only
//! transition is booked -> cancelled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Target show
    pub show_id: i64,
    /// Claimed seat, within 1..=show.total_seats
    pub seat_number: i64,
    /// Lifecycle state
    pub status: BookingStatus,
    /// Human-facing reference, "BK" + 8 hex chars, unique
    pub booking_reference: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Set when the booking is cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Whether this booking still claims its seat
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Booked
    }

    /// Generate a fresh booking reference, "BK" followed by the first 8
    /// characters of a hyphen-less uppercase UUID.
    pub fn generate_reference() -> String {
        let id = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("BK{}", &id[..8])
    }
}

/// Booking lifecycle state.
///
/// The state machine has exactly one transition: Booked -> Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Active claim on a seat
    Booked,
    /// Released; the seat is available again
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Booked => write!(f, "booked"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "booked" => Ok(BookingStatus::Booked),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid booking status: {}", s)),
        }
    }
}

/// Input for inserting a booking row
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub show_id: i64,
    pub seat_number: i64,
    pub booking_reference: String,
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// References always match the documented shape
        #[test]
        fn property_reference_shape(_dummy in 0..20i32) {
            let reference = Booking::generate_reference();
            let re = regex::Regex::new("^BK[0-9A-F]{8}$").unwrap();
            prop_assert!(re.is_match(&reference));
        }
    }
}
