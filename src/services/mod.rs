//! Business logic services
//!
//! Services hold the booking-domain rules. They depend on repository traits,
//! never on a concrete database driver, and take the authenticated identity
//! and the clock as explicit arguments.

pub mod booking;
pub mod movie;
pub mod password;
pub mod token;
pub mod user;

pub use booking::{BookingError, BookingService, BookingStatsReport, SeatAvailability};
pub use movie::{MovieService, MovieServiceError};
pub use token::{Claims, TokenError, TokenPair, TokenService};
pub use user::{UserService, UserServiceError};
