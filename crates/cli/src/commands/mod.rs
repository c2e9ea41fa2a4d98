//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod trash;

use ecommerce_store::{Repositories, StoreConfig};
use tracing::info;

/// Load configuration from the environment and connect to the database.
async fn connect() -> Result<Repositories, Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let repos = Repositories::connect(&config).await?;
    info!(policy = %config.delete_policy, "Connected to database");
    Ok(repos)
}
