//! Persistence backends and repository errors.
//!
//! # Tables
//!
//! One table per entity (`users`, `roles`, `user_roles`, `categories`,
//! `merchants`, `orders`, `order_items`, `products`, `transactions`, `carts`,
//! `reviews`, `shipping_addresses`, `sliders`). Every table carries `id`,
//! `created_at`, `updated_at` and a nullable `deleted_at`; soft deletion is
//! `deleted_at IS NOT NULL`, there is no separate trash table.
//!
//! # Backends
//!
//! - [`PgBackend`] - `PostgreSQL` through a shared `sqlx` pool
//! - [`MemoryBackend`] - in-process tables, used by tests and tooling
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p ecommerce-cli -- migrate
//! ```

pub mod backend;
pub mod memory;
pub mod postgres;

use sqlx::PgPool;
use sqlx::error::ErrorKind;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use secrecy::ExposeSecret;

use crate::config::StoreConfig;

pub use backend::{Filter, Key, Patch, RecordBackend, TransitionOutcome, Value, Visibility, Window};
pub use memory::MemoryBackend;
pub use postgres::PgBackend;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The id does not resolve to a record in a state the operation accepts.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name, e.g. `product`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Constraint violation (e.g., unique email, missing parent record).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Stored values rejected by a check constraint.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Storage failure from sqlx (connection loss, timeout, ...).
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl RepositoryError {
    /// Build a [`RepositoryError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the caller may retry the operation unchanged.
    ///
    /// Covers lost connections, pool exhaustion, and serialization failures
    /// or deadlocks reported by `PostgreSQL`. The store itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut) => true,
            Self::Storage(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
            }
            _ => false,
        }
    }

    /// Classify an error raised by an insert or update.
    pub(crate) fn from_write(err: sqlx::Error, entity: &'static str) -> Self {
        let sqlx::Error::Database(ref db_err) = err else {
            return Self::Storage(err);
        };
        let constraint = db_err.constraint().unwrap_or("unnamed constraint").to_owned();
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                Self::Conflict(format!("{entity} already exists ({constraint})"))
            }
            ErrorKind::ForeignKeyViolation => Self::Conflict(format!(
                "{entity} references a missing record ({constraint})"
            )),
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                Self::Validation(format!("{entity}: {}", db_err.message()))
            }
            _ => Self::Storage(err),
        }
    }

    /// A stored row could not be decoded into domain types.
    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

/// Create a `PostgreSQL` connection pool from the store configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(config.database_url.expose_secret())
        .await
}

/// Apply all pending migrations from `crates/store/migrations/`.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
