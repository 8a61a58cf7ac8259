//! Database operations for the `loan` schema.
//!
//! ## Tables
//!
//! - `team`, `app_user`, `auth_token` - Accounts and API tokens
//! - `agency`, `solicitor` - Estate agencies and their solicitors
//! - `application_status` - Lookup table of application statuses
//! - `application` - Loan applications
//! - `estate`, `asset`, `asset_item`, `expense`, `expense_item`, `dispute` - Estates
//! - `audit_log` - Change history
//!
//! Functions that issue a single statement take any `PgExecutor`, so they can
//! run against the pool or inside a transaction (`&mut *tx`). Functions that
//! issue several statements take `&mut PgConnection`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p estate-desk-cli -- migrate
//! ```

pub mod agencies;
pub mod application_statuses;
pub mod applications;
pub mod audit;
pub mod estates;
pub mod solicitors;
pub mod teams;
pub mod tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::{PgExecutor, PgPool};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

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

    /// Row is still referenced by a `RESTRICT` foreign key.
    #[error("{0}")]
    Protected(String),
}

/// Map a write error, turning unique violations into `Conflict`.
pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Map a delete error, turning foreign key violations into `Protected`.
pub(crate) fn protected_delete(e: sqlx::Error, entity: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        let relation = db_err.table().unwrap_or("application");
        return RepositoryError::Protected(format!(
            "Cannot delete this {entity} because it is referenced by a protected foreign key: {relation}."
        ));
    }
    RepositoryError::Database(e)
}

/// Serialize get-or-create by natural key until the transaction ends.
///
/// Takes a transaction-scoped advisory lock on `scope:key`, so a concurrent
/// writer looking up the same key waits and then sees the committed row.
/// Must run inside a transaction; on a bare connection the lock is released
/// immediately.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the lock query fails.
pub async fn lock_natural_key(
    executor: impl PgExecutor<'_>,
    scope: &str,
    key: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("{scope}:{key}"))
        .execute(executor)
        .await?;
    Ok(())
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
