//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `DB_MAX_CONNECTIONS` - Pool size upper bound (default: 10)
//! - `DB_MIN_CONNECTIONS` - Connections kept open (default: 2)
//! - `DB_ACQUIRE_TIMEOUT_SECS` - Seconds to wait for a pooled connection (default: 10)
//! - `PERMANENT_DELETE_POLICY` - `any` or `trashed_only` (default: any)

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use ecommerce_core::DeletePolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Connection pool and lifecycle settings for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `PostgreSQL` connection string (redacted in `Debug`).
    pub database_url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// Which records `delete_permanent` accepts.
    pub delete_policy: DeletePolicy,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or a value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = SecretString::from(get_required(&lookup, "DATABASE_URL")?);
        let max_connections: u32 = get_parsed_or_default(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        let min_connections: u32 = get_parsed_or_default(&lookup, "DB_MIN_CONNECTIONS", 2)?;
        let acquire_timeout_secs: u64 =
            get_parsed_or_default(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 10)?;
        let delete_policy =
            get_parsed_or_default(&lookup, "PERMANENT_DELETE_POLICY", DeletePolicy::AnyState)?;

        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if min_connections > max_connections {
            return Err(ConfigError::InvalidEnvVar(
                "DB_MIN_CONNECTIONS".to_string(),
                format!("{min_connections} exceeds DB_MAX_CONNECTIONS ({max_connections})"),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            min_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            delete_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable, treating blank values as missing.
fn get_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable, falling back to `default` when it is unset.
fn get_parsed_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
