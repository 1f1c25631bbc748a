//! Show repository
//!
//! Database operations for scheduled screenings.
//!
//! This module provides:
//! - `ShowRepository` trait defining the interface for show data access
//! - `SqlxShowRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateShowInput, Show};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Show repository trait
#[async_trait]
pub trait ShowRepository: Send + Sync {
    /// Create a new show
    async fn create(&self, input: &CreateShowInput) -> Result<Show>;

    /// Get show by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Show>>;

    /// List active future shows for a movie, soonest first
    async fn list_future_by_movie(&self, movie_id: i64, now: DateTime<Utc>) -> Result<Vec<Show>>;

    /// Find a show occupying the given screen at the given time
    async fn find_by_screen_and_time(
        &self,
        screen_name: &str,
        date_time: DateTime<Utc>,
    ) -> Result<Option<Show>>;
}

/// SQLx-based show repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxShowRepository {
    pool: DynDatabasePool,
}

impl SqlxShowRepository {
    /// Create a new SQLx show repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ShowRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ShowRepository for SqlxShowRepository {
    async fn create(&self, input: &CreateShowInput) -> Result<Show> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_show_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_show_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Show>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_show_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_show_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_future_by_movie(&self, movie_id: i64, now: DateTime<Utc>) -> Result<Vec<Show>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_future_by_movie_sqlite(self.pool.as_sqlite().unwrap(), movie_id, now).await
            }
            DatabaseDriver::Mysql => {
                list_future_by_movie_mysql(self.pool.as_mysql().unwrap(), movie_id, now).await
            }
        }
    }

    async fn find_by_screen_and_time(
        &self,
        screen_name: &str,
        date_time: DateTime<Utc>,
    ) -> Result<Option<Show>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_by_screen_and_time_sqlite(self.pool.as_sqlite().unwrap(), screen_name, date_time)
                    .await
            }
            DatabaseDriver::Mysql => {
                find_by_screen_and_time_mysql(self.pool.as_mysql().unwrap(), screen_name, date_time)
                    .await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_show_sqlite(pool: &SqlitePool, input: &CreateShowInput) -> Result<Show> {
    let result = sqlx::query(
        r#"
        INSERT INTO shows (movie_id, screen_name, date_time, total_seats, price_cents, is_active)
        VALUES (?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(input.movie_id)
    .bind(&input.screen_name)
    .bind(input.date_time)
    .bind(input.total_seats)
    .bind(input.price_cents)
    .execute(pool)
    .await
    .context("Failed to create show")?;

    Ok(Show {
        id: result.last_insert_rowid(),
        movie_id: input.movie_id,
        screen_name: input.screen_name.clone(),
        date_time: input.date_time,
        total_seats: input.total_seats,
        price_cents: input.price_cents,
        is_active: true,
    })
}

async fn get_show_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Show>> {
    let row = sqlx::query(
        r#"
        SELECT id, movie_id, screen_name, date_time, total_seats, price_cents, is_active
        FROM shows
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get show by ID")?;

    Ok(row.map(|row| row_to_show_sqlite(&row)))
}

async fn list_future_by_movie_sqlite(
    pool: &SqlitePool,
    movie_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Show>> {
    let rows = sqlx::query(
        r#"
        SELECT id, movie_id, screen_name, date_time, total_seats, price_cents, is_active
        FROM shows
        WHERE movie_id = ? AND date_time > ? AND is_active = 1
        ORDER BY date_time
        "#,
    )
    .bind(movie_id)
    .bind(now)
    .fetch_all(pool)
    .await
    .context("Failed to list shows for movie")?;

    Ok(rows.iter().map(row_to_show_sqlite).collect())
}

async fn find_by_screen_and_time_sqlite(
    pool: &SqlitePool,
    screen_name: &str,
    date_time: DateTime<Utc>,
) -> Result<Option<Show>> {
    let row = sqlx::query(
        r#"
        SELECT id, movie_id, screen_name, date_time, total_seats, price_cents, is_active
        FROM shows
        WHERE screen_name = ? AND date_time = ?
        "#,
    )
    .bind(screen_name)
    .bind(date_time)
    .fetch_optional(pool)
    .await
    .context("Failed to look up show by screen and time")?;

    Ok(row.map(|row| row_to_show_sqlite(&row)))
}

fn row_to_show_sqlite(row: &sqlx::sqlite::SqliteRow) -> Show {
    Show {
        id: row.get("id"),
        movie_id: row.get("movie_id"),
        screen_name: row.get("screen_name"),
        date_time: row.get("date_time"),
        total_seats: row.get("total_seats"),
        price_cents: row.get("price_cents"),
        is_active: row.get("is_active"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_show_mysql(pool: &MySqlPool, input: &CreateShowInput) -> Result<Show> {
    let result = sqlx::query(
        r#"
        INSERT INTO shows (movie_id, screen_name, date_time, total_seats, price_cents, is_active)
        VALUES (?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(input.movie_id)
    .bind(&input.screen_name)
    .bind(input.date_time)
    .bind(input.total_seats)
    .bind(input.price_cents)
    .execute(pool)
    .await
    .context("Failed to create show")?;

    Ok(Show {
        id: result.last_insert_id() as i64,
        movie_id: input.movie_id,
        screen_name: input.screen_name.clone(),
        date_time: input.date_time,
        total_seats: input.total_seats,
        price_cents: input.price_cents,
        is_active: true,
    })
}

async fn get_show_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Show>> {
    let row = sqlx::query(
        r#"
        SELECT id, movie_id, screen_name, date_time, total_seats, price_cents, is_active
        FROM shows
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get show by ID")?;

    Ok(row.map(|row| row_to_show_mysql(&row)))
}

async fn list_future_by_movie_mysql(
    pool: &MySqlPool,
    movie_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Show>> {
    let rows = sqlx::query(
        r#"
        SELECT id, movie_id, screen_name, date_time, total_seats, price_cents, is_active
        FROM shows
        WHERE movie_id = ? AND date_time > ? AND is_active = 1
        ORDER BY date_time
        "#,
    )
    .bind(movie_id)
    .bind(now)
    .fetch_all(pool)
    .await
    .context("Failed to list shows for movie")?;

    Ok(rows.iter().map(row_to_show_mysql).collect())
}

async fn find_by_screen_and_time_mysql(
    pool: &MySqlPool,
    screen_name: &str,
    date_time: DateTime<Utc>,
) -> Result<Option<Show>> {
    let row = sqlx::query(
        r#"
        SELECT id, movie_id, screen_name, date_time, total_seats, price_cents, is_active
        FROM shows
        WHERE screen_name = ? AND date_time = ?
        "#,
    )
    .bind(screen_name)
    .bind(date_time)
    .fetch_optional(pool)
    .await
    .context("Failed to look up show by screen and time")?;

    Ok(row.map(|row| row_to_show_mysql(&row)))
}

fn row_to_show_mysql(row: &sqlx::mysql::MySqlRow) -> Show {
    Show {
        id: row.get("id"),
        movie_id: row.get("movie_id"),
        screen_name: row.get("screen_name"),
        date_time: row.get("date_time"),
        total_seats: row.get("total_seats"),
        price_cents: row.get("price_cents"),
        is_active: row.get("is_active"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{MovieRepository, SqlxMovieRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateMovieInput;
    use chrono::Duration;

    async fn setup() -> (SqlxShowRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations should run");

        let movies = SqlxMovieRepository::new(pool.clone());
        let movie = movies
            .create(&CreateMovieInput {
                title: "Blade Runner".to_string(),
                duration_minutes: 117,
                description: None,
                rating: None,
            })
            .await
            .expect("Movie create should succeed");

        (SqlxShowRepository::new(pool), movie.id)
    }

    fn input(movie_id: i64, screen: &str, date_time: DateTime<Utc>) -> CreateShowInput {
        CreateShowInput {
            movie_id,
            screen_name: screen.to_string(),
            date_time,
            total_seats: 100,
            price_cents: 1200,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, movie_id) = setup().await;
        let when = Utc::now() + Duration::days(2);
        let show = repo
            .create(&input(movie_id, "Screen 1", when))
            .await
            .expect("Create should succeed");
        assert!(show.id > 0);
        assert!(show.is_active);

        let fetched = repo
            .get_by_id(show.id)
            .await
            .expect("Get should succeed")
            .expect("Show should exist");
        assert_eq!(fetched.screen_name, "Screen 1");
        assert_eq!(fetched.total_seats, 100);
    }

    #[tokio::test]
    async fn test_list_future_excludes_past() {
        let (repo, movie_id) = setup().await;
        let now = Utc::now();
        repo.create(&input(movie_id, "A", now + Duration::days(1)))
            .await
            .expect("Create");
        repo.create(&input(movie_id, "B", now - Duration::days(1)))
            .await
            .expect("Create");

        let shows = repo
            .list_future_by_movie(movie_id, now)
            .await
            .expect("List should succeed");
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].screen_name, "A");
    }

    #[tokio::test]
    async fn test_list_future_ordered_soonest_first() {
        let (repo, movie_id) = setup().await;
        let now = Utc::now();
        repo.create(&input(movie_id, "Late", now + Duration::days(3)))
            .await
            .expect("Create");
        repo.create(&input(movie_id, "Soon", now + Duration::days(1)))
            .await
            .expect("Create");

        let shows = repo
            .list_future_by_movie(movie_id, now)
            .await
            .expect("List should succeed");
        assert_eq!(shows[0].screen_name, "Soon");
        assert_eq!(shows[1].screen_name, "Late");
    }

    #[tokio::test]
    async fn test_find_by_screen_and_time() {
        let (repo, movie_id) = setup().await;
        let when = Utc::now() + Duration::days(1);
        repo.create(&input(movie_id, "IMAX", when))
            .await
            .expect("Create");

        assert!(repo
            .find_by_screen_and_time("IMAX", when)
            .await
            .expect("Lookup should succeed")
            .is_some());
        assert!(repo
            .find_by_screen_and_time("IMAX", when + Duration::hours(1))
            .await
            .expect("Lookup should succeed")
            .is_none());
    }
}
