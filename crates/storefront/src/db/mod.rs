//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts with argon2 password hashes and roles
//! - `products` - Menu items and their shelf stock
//! - `cart_lines` - Units reserved by a user, one row per (user, product)
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! Repositories borrow a single connection so that callers decide the
//! transaction boundary. Row-locking reads (`SELECT ... FOR UPDATE`) only
//! make sense inside a transaction; see [`crate::store::PgStore`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p canteen-cli -- migrate
//! ```

pub mod cart_lines;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart_lines::CartLineRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// SQLSTATE for a value that does not fit its column type.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Embedded storefront migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Translate a failed write into a repository error.
///
/// Unique and check violations, and values out of a column's range, become
/// [`RepositoryError::Conflict`]; a foreign key violation means the
/// referenced row is gone and becomes [`RepositoryError::NotFound`].
pub(crate) fn map_write_error(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation()
            || db_err.is_check_violation()
            || db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE)
        {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
