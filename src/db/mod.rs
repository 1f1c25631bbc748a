//! Database layer
//!
//! Database abstraction for the Cinebook booking system. Supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected from configuration. Repositories speak to a
//! trait-based `DatabasePool` so the rest of the application never knows the
//! concrete backend.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
