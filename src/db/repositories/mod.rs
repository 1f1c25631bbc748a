//! Database repositories
//!
//! Repository pattern implementations for database access. Each repository
//! handles the queries for a specific entity; services depend on the traits,
//! never on a concrete driver.

pub mod booking;
pub mod movie;
pub mod show;
pub mod user;

pub use booking::{
    BookingRepository, BookingStats, CreateOutcome, SqlxBookingRepository, TopMovie,
};
pub use movie::{MovieRepository, SqlxMovieRepository};
pub use show::{ShowRepository, SqlxShowRepository};
pub use user::{SqlxUserRepository, UserRepository};
