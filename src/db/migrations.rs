//! Database migrations module
//!
//! Code-based migrations for the Cinebook booking system. All migrations are
//! embedded as SQL strings, supporting both SQLite and MySQL for
//! single-binary deployment.
//!
//! # Architecture
//!
//! Each migration is a `Migration` struct containing:
//! - `version`: Unique version number for ordering
//! - `name`: Human-readable migration name
//! - `up_sqlite`: SQL for SQLite
//! - `up_mysql`: SQL for MySQL
//!
//! The seat-uniqueness rule (at most one booked booking per seat per show)
//! is enforced at the storage layer. SQLite uses a partial unique index over
//! status='booked' rows; MySQL has no partial indexes, so a stored generated
//! column (`active_flag`, 1 when booked, NULL otherwise) feeds a unique key
//! instead. NULLs never collide, so cancelled rows stay out of the way.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the Cinebook booking system.
/// These are embedded in the binary for single-binary deployment.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create users table
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'customer',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'customer',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_username ON users(username);
            CREATE INDEX idx_users_email ON users(email);
        "#,
    },
    // Migration 2: Create movies table
    Migration {
        version: 2,
        name: "create_movies",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                duration_minutes INTEGER NOT NULL,
                description TEXT,
                rating VARCHAR(10),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title);
            CREATE INDEX IF NOT EXISTS idx_movies_created_at ON movies(created_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS movies (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(200) NOT NULL,
                duration_minutes INT NOT NULL,
                description TEXT,
                rating VARCHAR(10),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_movies_title ON movies(title);
            CREATE INDEX idx_movies_created_at ON movies(created_at);
        "#,
    },
    // Migration 3: Create shows table
    Migration {
        version: 3,
        name: "create_shows",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS shows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id INTEGER NOT NULL,
                screen_name VARCHAR(100) NOT NULL,
                date_time TIMESTAMP NOT NULL,
                total_seats INTEGER NOT NULL,
                price_cents INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                FOREIGN KEY (movie_id) REFERENCES movies(id) ON DELETE CASCADE,
                UNIQUE (screen_name, date_time)
            );
            CREATE INDEX IF NOT EXISTS idx_shows_movie_date ON shows(movie_id, date_time);
            CREATE INDEX IF NOT EXISTS idx_shows_date_time ON shows(date_time);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS shows (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                movie_id BIGINT NOT NULL,
                screen_name VARCHAR(100) NOT NULL,
                date_time TIMESTAMP NOT NULL,
                total_seats INT NOT NULL,
                price_cents BIGINT NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                FOREIGN KEY (movie_id) REFERENCES movies(id) ON DELETE CASCADE,
                UNIQUE KEY uniq_shows_screen_slot (screen_name, date_time)
            );
            CREATE INDEX idx_shows_movie_date ON shows(movie_id, date_time);
            CREATE INDEX idx_shows_date_time ON shows(date_time);
        "#,
    },
    // Migration 4: Create bookings table with active-seat uniqueness
    Migration {
        version: 4,
        name: "create_bookings",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                show_id INTEGER NOT NULL,
                seat_number INTEGER NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'booked',
                booking_reference VARCHAR(20) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                cancelled_at TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (show_id) REFERENCES shows(id) ON DELETE CASCADE
            );
            CREATE UNIQUE INDEX IF NOT EXISTS uniq_bookings_active_seat
                ON bookings(show_id, seat_number) WHERE status = 'booked';
            CREATE INDEX IF NOT EXISTS idx_bookings_user_status ON bookings(user_id, status);
            CREATE INDEX IF NOT EXISTS idx_bookings_show_status ON bookings(show_id, status);
            CREATE INDEX IF NOT EXISTS idx_bookings_created_at ON bookings(created_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                user_id BIGINT NOT NULL,
                show_id BIGINT NOT NULL,
                seat_number INT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'booked',
                booking_reference VARCHAR(20) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                cancelled_at TIMESTAMP NULL,
                active_flag TINYINT GENERATED ALWAYS AS
                    (CASE WHEN status = 'booked' THEN 1 ELSE NULL END) STORED,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (show_id) REFERENCES shows(id) ON DELETE CASCADE,
                UNIQUE KEY uniq_bookings_active_seat (show_id, seat_number, active_flag)
            );
            CREATE INDEX idx_bookings_user_status ON bookings(user_id, status);
            CREATE INDEX idx_bookings_show_status ON bookings(show_id, status);
            CREATE INDEX idx_bookings_created_at ON bookings(created_at);
        "#,
    },
];

/// Run all pending migrations, returning how many were applied
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations bookkeeping table
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.as_sqlite().unwrap()).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.as_mysql().unwrap()).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Handle last statement without trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    let _ = create_migrations_table(pool).await;
    let applied = get_applied_migrations(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    let _ = create_migrations_table(pool).await;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        let count = run_migrations(&pool).await.expect("Migrations should run");
        assert_eq!(count, MIGRATIONS.len());

        // Running again is a no-op
        let count = run_migrations(&pool).await.expect("Migrations should run");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        assert!(!is_up_to_date(&pool).await.expect("Check should succeed"));

        run_migrations(&pool).await.expect("Migrations should run");
        assert!(is_up_to_date(&pool).await.expect("Check should succeed"));
    }

    #[tokio::test]
    async fn test_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        assert_eq!(
            pending_count(&pool).await.expect("Count should succeed"),
            MIGRATIONS.len()
        );

        run_migrations(&pool).await.expect("Migrations should run");
        assert_eq!(pending_count(&pool).await.expect("Count should succeed"), 0);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations should run");

        for table in ["users", "movies", "shows", "bookings"] {
            let sqlite = pool.as_sqlite().unwrap();
            let row =
                sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
                    .bind(table)
                    .fetch_optional(sqlite)
                    .await
                    .expect("Query should succeed");
            assert!(row.is_some(), "Table {} should exist", table);
        }
    }

    #[tokio::test]
    async fn test_active_seat_uniqueness_enforced() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations should run");
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (username, email, password_hash) VALUES ('u', 'u@x.com', 'h')")
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query("INSERT INTO movies (title, duration_minutes) VALUES ('M', 100)")
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO shows (movie_id, screen_name, date_time, total_seats) VALUES (1, 'S', '2099-01-01 20:00:00', 50)",
        )
        .execute(sqlite)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO bookings (user_id, show_id, seat_number, status, booking_reference) VALUES (1, 1, 3, 'booked', 'BKAAAAAAA1')",
        )
        .execute(sqlite)
        .await
        .expect("First booking should insert");

        // Same seat, same show, still booked: rejected
        let duplicate = sqlx::query(
            "INSERT INTO bookings (user_id, show_id, seat_number, status, booking_reference) VALUES (1, 1, 3, 'booked', 'BKAAAAAAA2')",
        )
        .execute(sqlite)
        .await;
        assert!(duplicate.is_err());

        // A cancelled row for the same seat does not collide
        sqlx::query(
            "INSERT INTO bookings (user_id, show_id, seat_number, status, booking_reference) VALUES (1, 1, 3, 'cancelled', 'BKAAAAAAA3')",
        )
        .execute(sqlite)
        .await
        .expect("Cancelled row should insert");
    }

    #[tokio::test]
    async fn test_screen_slot_uniqueness() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations should run");
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO movies (title, duration_minutes) VALUES ('M', 100)")
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO shows (movie_id, screen_name, date_time, total_seats) VALUES (1, 'S', '2099-01-01 20:00:00', 50)",
        )
        .execute(sqlite)
        .await
        .unwrap();

        let conflict = sqlx::query(
            "INSERT INTO shows (movie_id, screen_name, date_time, total_seats) VALUES (1, 'S', '2099-01-01 20:00:00', 80)",
        )
        .execute(sqlite)
        .await;
        assert!(conflict.is_err());
    }
}
