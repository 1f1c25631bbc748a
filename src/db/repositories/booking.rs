//! Booking repository
//!
//! Database operations for seat bookings.
//!
//! This module provides:
//! - `BookingRepository` trait defining the interface for booking data access
//! - `SqlxBookingRepository` implementing the trait for SQLite and MySQL
//!
//! Seat contention is decided here: `create` inserts the row and lets the
//! storage-level uniqueness constraint on active (show, seat) pairs reject
//! the loser of a race. A rejected insert surfaces as
//! `CreateOutcome::SeatTaken` rather than an error, so the service layer can
//! turn it into a conflict response.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Booking, BookingStatus, NewBooking};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Result of a booking insert attempt
#[derive(Debug)]
pub enum CreateOutcome {
    /// The booking row was inserted
    Created(Booking),
    /// Another active booking already holds this (show, seat) pair
    SeatTaken,
}

/// Aggregate booking counts for the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingStats {
    pub total: i64,
    pub active: i64,
    pub cancelled: i64,
}

/// A movie ranked by active booking count
#[derive(Debug, Clone)]
pub struct TopMovie {
    pub movie_id: i64,
    pub title: String,
    pub booking_count: i64,
}

/// Booking repository trait
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking, reporting seat contention as an outcome
    async fn create(&self, new: &NewBooking) -> Result<CreateOutcome>;

    /// Get booking by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>>;

    /// List all bookings for a user, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Booking>>;

    /// Count a user's active bookings on a show
    async fn count_active_for_user_show(&self, user_id: i64, show_id: i64) -> Result<i64>;

    /// Seat numbers currently booked on a show, ascending
    async fn booked_seat_numbers(&self, show_id: i64) -> Result<Vec<i64>>;

    /// Find the active booking holding a (show, seat) pair, if any
    async fn find_active_by_show_seat(&self, show_id: i64, seat_number: i64)
        -> Result<Option<Booking>>;

    /// Mark a booking cancelled, recording when
    async fn cancel(&self, id: i64, cancelled_at: DateTime<Utc>) -> Result<()>;

    /// Booking counts since a point in time
    async fn stats_since(&self, since: DateTime<Utc>) -> Result<BookingStats>;

    /// Movies ranked by active bookings made since a point in time
    async fn top_movies_since(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<TopMovie>>;
}

/// SQLx-based booking repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxBookingRepository {
    pool: DynDatabasePool,
}

impl SqlxBookingRepository {
    /// Create a new SQLx booking repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BookingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BookingRepository for SqlxBookingRepository {
    async fn create(&self, new: &NewBooking) -> Result<CreateOutcome> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_booking_sqlite(self.pool.as_sqlite().unwrap(), new).await
            }
            DatabaseDriver::Mysql => create_booking_mysql(self.pool.as_mysql().unwrap(), new).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_booking_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_booking_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Booking>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => list_by_user_mysql(self.pool.as_mysql().unwrap(), user_id).await,
        }
    }

    async fn count_active_for_user_show(&self, user_id: i64, show_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_active_sqlite(self.pool.as_sqlite().unwrap(), user_id, show_id).await
            }
            DatabaseDriver::Mysql => {
                count_active_mysql(self.pool.as_mysql().unwrap(), user_id, show_id).await
            }
        }
    }

    async fn booked_seat_numbers(&self, show_id: i64) -> Result<Vec<i64>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                booked_seats_sqlite(self.pool.as_sqlite().unwrap(), show_id).await
            }
            DatabaseDriver::Mysql => booked_seats_mysql(self.pool.as_mysql().unwrap(), show_id).await,
        }
    }

    async fn find_active_by_show_seat(
        &self,
        show_id: i64,
        seat_number: i64,
    ) -> Result<Option<Booking>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_active_sqlite(self.pool.as_sqlite().unwrap(), show_id, seat_number).await
            }
            DatabaseDriver::Mysql => {
                find_active_mysql(self.pool.as_mysql().unwrap(), show_id, seat_number).await
            }
        }
    }

    async fn cancel(&self, id: i64, cancelled_at: DateTime<Utc>) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                cancel_booking_sqlite(self.pool.as_sqlite().unwrap(), id, cancelled_at).await
            }
            DatabaseDriver::Mysql => {
                cancel_booking_mysql(self.pool.as_mysql().unwrap(), id, cancelled_at).await
            }
        }
    }

    async fn stats_since(&self, since: DateTime<Utc>) -> Result<BookingStats> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => stats_since_sqlite(self.pool.as_sqlite().unwrap(), since).await,
            DatabaseDriver::Mysql => stats_since_mysql(self.pool.as_mysql().unwrap(), since).await,
        }
    }

    async fn top_movies_since(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<TopMovie>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                top_movies_sqlite(self.pool.as_sqlite().unwrap(), since, limit).await
            }
            DatabaseDriver::Mysql => {
                top_movies_mysql(self.pool.as_mysql().unwrap(), since, limit).await
            }
        }
    }
}

/// Whether an insert failure came from the database's uniqueness machinery
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_booking_sqlite(pool: &SqlitePool, new: &NewBooking) -> Result<CreateOutcome> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO bookings (user_id, show_id, seat_number, status, booking_reference, created_at)
        VALUES (?, ?, ?, 'booked', ?, ?)
        "#,
    )
    .bind(new.user_id)
    .bind(new.show_id)
    .bind(new.seat_number)
    .bind(&new.booking_reference)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(CreateOutcome::Created(Booking {
            id: done.last_insert_rowid(),
            user_id: new.user_id,
            show_id: new.show_id,
            seat_number: new.seat_number,
            status: BookingStatus::Booked,
            booking_reference: new.booking_reference.clone(),
            created_at: now,
            cancelled_at: None,
        })),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::SeatTaken),
        Err(err) => Err(err).context("Failed to create booking"),
    }
}

async fn get_booking_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Booking>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, show_id, seat_number, status, booking_reference, created_at, cancelled_at
        FROM bookings
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get booking by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_booking_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_by_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<Booking>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, show_id, seat_number, status, booking_reference, created_at, cancelled_at
        FROM bookings
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list bookings for user")?;

    rows.iter().map(row_to_booking_sqlite).collect()
}

async fn count_active_sqlite(pool: &SqlitePool, user_id: i64, show_id: i64) -> Result<i64> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as count FROM bookings
        WHERE user_id = ? AND show_id = ? AND status = 'booked'
        "#,
    )
    .bind(user_id)
    .bind(show_id)
    .fetch_one(pool)
    .await
    .context("Failed to count active bookings")?;

    Ok(row.get("count"))
}

async fn booked_seats_sqlite(pool: &SqlitePool, show_id: i64) -> Result<Vec<i64>> {
    let rows = sqlx::query(
        r#"
        SELECT seat_number FROM bookings
        WHERE show_id = ? AND status = 'booked'
        ORDER BY seat_number
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await
    .context("Failed to list booked seats")?;

    Ok(rows.iter().map(|row| row.get("seat_number")).collect())
}

async fn find_active_sqlite(
    pool: &SqlitePool,
    show_id: i64,
    seat_number: i64,
) -> Result<Option<Booking>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, show_id, seat_number, status, booking_reference, created_at, cancelled_at
        FROM bookings
        WHERE show_id = ? AND seat_number = ? AND status = 'booked'
        "#,
    )
    .bind(show_id)
    .bind(seat_number)
    .fetch_optional(pool)
    .await
    .context("Failed to look up active booking")?;

    match row {
        Some(row) => Ok(Some(row_to_booking_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn cancel_booking_sqlite(
    pool: &SqlitePool,
    id: i64,
    cancelled_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE bookings SET status = 'cancelled', cancelled_at = ?
        WHERE id = ? AND status = 'booked'
        "#,
    )
    .bind(cancelled_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to cancel booking")?;

    Ok(())
}

async fn stats_since_sqlite(pool: &SqlitePool, since: DateTime<Utc>) -> Result<BookingStats> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) as total,
            COALESCE(SUM(CASE WHEN status = 'booked' THEN 1 ELSE 0 END), 0) as active,
            COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) as cancelled
        FROM bookings
        WHERE created_at >= ?
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await
    .context("Failed to compute booking stats")?;

    Ok(BookingStats {
        total: row.get("total"),
        active: row.get("active"),
        cancelled: row.get("cancelled"),
    })
}

async fn top_movies_sqlite(
    pool: &SqlitePool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<TopMovie>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id as movie_id, m.title as title, COUNT(*) as booking_count
        FROM bookings b
        JOIN shows s ON s.id = b.show_id
        JOIN movies m ON m.id = s.movie_id
        WHERE b.status = 'booked' AND b.created_at >= ?
        GROUP BY m.id, m.title
        ORDER BY booking_count DESC, m.title
        LIMIT ?
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to rank movies by bookings")?;

    Ok(rows
        .iter()
        .map(|row| TopMovie {
            movie_id: row.get("movie_id"),
            title: row.get("title"),
            booking_count: row.get("booking_count"),
        })
        .collect())
}

fn row_to_booking_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Booking> {
    let status_str: String = row.get("status");
    let status = BookingStatus::from_str(&status_str)
        .with_context(|| format!("Invalid booking status in database: {}", status_str))?;

    Ok(Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        show_id: row.get("show_id"),
        seat_number: row.get("seat_number"),
        status,
        booking_reference: row.get("booking_reference"),
        created_at: row.get("created_at"),
        cancelled_at: row.get("cancelled_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_booking_mysql(pool: &MySqlPool, new: &NewBooking) -> Result<CreateOutcome> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO bookings (user_id, show_id, seat_number, status, booking_reference, created_at)
        VALUES (?, ?, ?, 'booked', ?, ?)
        "#,
    )
    .bind(new.user_id)
    .bind(new.show_id)
    .bind(new.seat_number)
    .bind(&new.booking_reference)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(CreateOutcome::Created(Booking {
            id: done.last_insert_id() as i64,
            user_id: new.user_id,
            show_id: new.show_id,
            seat_number: new.seat_number,
            status: BookingStatus::Booked,
            booking_reference: new.booking_reference.clone(),
            created_at: now,
            cancelled_at: None,
        })),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::SeatTaken),
        Err(err) => Err(err).context("Failed to create booking"),
    }
}

async fn get_booking_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Booking>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, show_id, seat_number, status, booking_reference, created_at, cancelled_at
        FROM bookings
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get booking by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_booking_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_by_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<Booking>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, show_id, seat_number, status, booking_reference, created_at, cancelled_at
        FROM bookings
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list bookings for user")?;

    rows.iter().map(row_to_booking_mysql).collect()
}

async fn count_active_mysql(pool: &MySqlPool, user_id: i64, show_id: i64) -> Result<i64> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as count FROM bookings
        WHERE user_id = ? AND show_id = ? AND status = 'booked'
        "#,
    )
    .bind(user_id)
    .bind(show_id)
    .fetch_one(pool)
    .await
    .context("Failed to count active bookings")?;

    Ok(row.get("count"))
}

async fn booked_seats_mysql(pool: &MySqlPool, show_id: i64) -> Result<Vec<i64>> {
    let rows = sqlx::query(
        r#"
        SELECT seat_number FROM bookings
        WHERE show_id = ? AND status = 'booked'
        ORDER BY seat_number
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await
    .context("Failed to list booked seats")?;

    Ok(rows
        .iter()
        .map(|row| {
            let seat: i32 = row.get("seat_number");
            seat as i64
        })
        .collect())
}

async fn find_active_mysql(
    pool: &MySqlPool,
    show_id: i64,
    seat_number: i64,
) -> Result<Option<Booking>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, show_id, seat_number, status, booking_reference, created_at, cancelled_at
        FROM bookings
        WHERE show_id = ? AND seat_number = ? AND status = 'booked'
        "#,
    )
    .bind(show_id)
    .bind(seat_number)
    .fetch_optional(pool)
    .await
    .context("Failed to look up active booking")?;

    match row {
        Some(row) => Ok(Some(row_to_booking_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn cancel_booking_mysql(
    pool: &MySqlPool,
    id: i64,
    cancelled_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE bookings SET status = 'cancelled', cancelled_at = ?
        WHERE id = ? AND status = 'booked'
        "#,
    )
    .bind(cancelled_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to cancel booking")?;

    Ok(())
}

async fn stats_since_mysql(pool: &MySqlPool, since: DateTime<Utc>) -> Result<BookingStats> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) as total,
            CAST(COALESCE(SUM(CASE WHEN status = 'booked' THEN 1 ELSE 0 END), 0) AS SIGNED) as active,
            CAST(COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS SIGNED) as cancelled
        FROM bookings
        WHERE created_at >= ?
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await
    .context("Failed to compute booking stats")?;

    Ok(BookingStats {
        total: row.get("total"),
        active: row.get("active"),
        cancelled: row.get("cancelled"),
    })
}

async fn top_movies_mysql(
    pool: &MySqlPool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<TopMovie>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id as movie_id, m.title as title, COUNT(*) as booking_count
        FROM bookings b
        JOIN shows s ON s.id = b.show_id
        JOIN movies m ON m.id = s.movie_id
        WHERE b.status = 'booked' AND b.created_at >= ?
        GROUP BY m.id, m.title
        ORDER BY booking_count DESC, m.title
        LIMIT ?
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to rank movies by bookings")?;

    Ok(rows
        .iter()
        .map(|row| TopMovie {
            movie_id: row.get("movie_id"),
            title: row.get("title"),
            booking_count: row.get("booking_count"),
        })
        .collect())
}

fn row_to_booking_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Booking> {
    let status_str: String = row.get("status");
    let status = BookingStatus::from_str(&status_str)
        .with_context(|| format!("Invalid booking status in database: {}", status_str))?;

    let seat: i32 = row.get("seat_number");

    Ok(Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        show_id: row.get("show_id"),
        seat_number: seat as i64,
        status,
        booking_reference: row.get("booking_reference"),
        created_at: row.get("created_at"),
        cancelled_at: row.get("cancelled_at"),
    })
}
