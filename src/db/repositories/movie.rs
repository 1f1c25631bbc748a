//! Movie repository
//!
//! Database operations for the movie catalog.
//!
//! This module provides:
//! - `MovieRepository` trait defining the interface for movie data access
//! - `SqlxMovieRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateMovieInput, Movie};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Movie repository trait
#[async_trait]
pub trait MovieRepository: Send + Sync {
    /// Create a new movie
    async fn create(&self, input: &CreateMovieInput) -> Result<Movie>;

    /// Get movie by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Movie>>;

    /// List all movies ordered by title
    async fn list(&self) -> Result<Vec<Movie>>;

    /// Check whether a movie exists
    async fn exists(&self, id: i64) -> Result<bool>;
}

/// SQLx-based movie repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxMovieRepository {
    pool: DynDatabasePool,
}

impl SqlxMovieRepository {
    /// Create a new SQLx movie repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MovieRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MovieRepository for SqlxMovieRepository {
    async fn create(&self, input: &CreateMovieInput) -> Result<Movie> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_movie_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => create_movie_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Movie>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_movie_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_movie_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Movie>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_movies_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_movies_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_movie_sqlite(pool: &SqlitePool, input: &CreateMovieInput) -> Result<Movie> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO movies (title, duration_minutes, description, rating, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(input.duration_minutes)
    .bind(&input.description)
    .bind(&input.rating)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create movie")?;

    Ok(Movie {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        duration_minutes: input.duration_minutes,
        description: input.description.clone(),
        rating: input.rating.clone(),
        created_at: now,
    })
}

async fn get_movie_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Movie>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, duration_minutes, description, rating, created_at
        FROM movies
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get movie by ID")?;

    Ok(row.map(|row| row_to_movie_sqlite(&row)))
}

async fn list_movies_sqlite(pool: &SqlitePool) -> Result<Vec<Movie>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, duration_minutes, description, rating, created_at
        FROM movies
        ORDER BY title
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list movies")?;

    Ok(rows.iter().map(row_to_movie_sqlite).collect())
}

fn row_to_movie_sqlite(row: &sqlx::sqlite::SqliteRow) -> Movie {
    Movie {
        id: row.get("id"),
        title: row.get("title"),
        duration_minutes: row.get("duration_minutes"),
        description: row.get("description"),
        rating: row.get("rating"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_movie_mysql(pool: &MySqlPool, input: &CreateMovieInput) -> Result<Movie> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO movies (title, duration_minutes, description, rating, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(input.duration_minutes)
    .bind(&input.description)
    .bind(&input.rating)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create movie")?;

    Ok(Movie {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        duration_minutes: input.duration_minutes,
        description: input.description.clone(),
        rating: input.rating.clone(),
        created_at: now,
    })
}

async fn get_movie_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Movie>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, duration_minutes, description, rating, created_at
        FROM movies
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get movie by ID")?;

    Ok(row.map(|row| row_to_movie_mysql(&row)))
}

async fn list_movies_mysql(pool: &MySqlPool) -> Result<Vec<Movie>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, duration_minutes, description, rating, created_at
        FROM movies
        ORDER BY title
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list movies")?;

    Ok(rows.iter().map(row_to_movie_mysql).collect())
}

fn row_to_movie_mysql(row: &sqlx::mysql::MySqlRow) -> Movie {
    Movie {
        id: row.get("id"),
        title: row.get("title"),
        duration_minutes: row.get("duration_minutes"),
        description: row.get("description"),
        rating: row.get("rating"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn test_repo() -> SqlxMovieRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations should run");
        SqlxMovieRepository::new(pool)
    }

    fn input(title: &str) -> CreateMovieInput {
        CreateMovieInput {
            title: title.to_string(),
            duration_minutes: 120,
            description: None,
            rating: Some("PG".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = test_repo().await;
        let movie = repo
            .create(&input("Arrival"))
            .await
            .expect("Create should succeed");
        assert!(movie.id > 0);

        let fetched = repo
            .get_by_id(movie.id)
            .await
            .expect("Get should succeed")
            .expect("Movie should exist");
        assert_eq!(fetched.title, "Arrival");
        assert_eq!(fetched.rating.as_deref(), Some("PG"));
    }

    #[tokio::test]
    async fn test_list_ordered_by_title() {
        let repo = test_repo().await;
        repo.create(&input("Zodiac")).await.expect("Create");
        repo.create(&input("Alien")).await.expect("Create");

        let movies = repo.list().await.expect("List should succeed");
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Alien");
        assert_eq!(movies[1].title, "Zodiac");
    }

    #[tokio::test]
    async fn test_exists() {
        let repo = test_repo().await;
        let movie = repo.create(&input("Heat")).await.expect("Create");
        assert!(repo.exists(movie.id).await.expect("Exists should succeed"));
        assert!(!repo.exists(9999).await.expect("Exists should succeed"));
    }
}
