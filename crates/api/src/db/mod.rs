//! Database operations for the Marketstall `PostgreSQL` store.
//!
//! ## Tables (schema `marketstall`)
//!
//! - `users` - Accounts with role and Argon2 password hash
//! - `products` - Catalog entries, each owned by a retailer
//! - `orders` / `order_items` - Placed orders with price snapshots
//! - `carts` / `cart_items` - One staging cart per user
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p marketstall-cli -- migrate
//! ```

pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

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

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key pointed at a row that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

/// Translate constraint violations on a write into repository errors.
///
/// `conflict` describes what a unique violation means for this write;
/// `reference` describes what a foreign key violation means.
pub(crate) fn classify_write_error(
    err: sqlx::Error,
    conflict: &str,
    reference: &str,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(reference.to_owned());
        }
    }
    RepositoryError::Database(err)
}

/// Convert a stored `INTEGER` quantity into its unsigned domain value.
pub(crate) fn quantity_from_row(value: i32) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative quantity in database: {value}")))
}

/// Convert an unsigned domain quantity into its stored `INTEGER` value.
pub(crate) fn quantity_to_row(value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {value} is out of range")))
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
