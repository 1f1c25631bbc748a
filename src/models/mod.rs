//! Data models
//!
//! This module contains all data structures used throughout the Cinebook
//! booking system. Models represent:
//! - Database entities (User, Movie, Show, Booking)
//! - Input structs for creating entities
//! - Status enums with their parsing/formatting rules

mod booking;
mod movie;
mod show;
mod user;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use movie::{CreateMovieInput, Movie};
pub use show::{CreateShowInput, Show};
pub use user::{CreateUserInput, User, UserRole};
