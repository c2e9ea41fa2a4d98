//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ecom-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migrations live in `crates/store/migrations/` and are embedded at build time.

use tracing::info;

use ecommerce_store::{StoreConfig, db};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&config).await?;

    info!("Running migrations...");
    db::migrate(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
