//! E-commerce CLI - database migrations and store maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ecom-cli migrate
//!
//! # Seed reference data (roles, categories, sliders)
//! ecom-cli seed -f seed.yaml
//!
//! # Restore or purge the trash of one entity
//! ecom-cli trash restore-all product
//! ecom-cli trash purge order-item --yes
//!
//! # Record counts per entity
//! ecom-cli stats
//! ecom-cli stats user
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert reference data from a YAML file
//! - `trash` - Bulk restore or permanently delete trashed records
//! - `stats` - Active / trashed counts

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ecommerce_store::EntityKind;

mod commands;

#[derive(Parser)]
#[command(name = "ecom-cli")]
#[command(author, version, about = "E-commerce store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long, default_value = "seed.yaml")]
        file: PathBuf,
    },
    /// Maintain the trash of one entity
    Trash {
        #[command(subcommand)]
        action: TrashAction,
    },
    /// Show active and trashed record counts
    Stats {
        /// Entity to report on (all entities if omitted)
        entity: Option<EntityKind>,
    },
}

#[derive(Subcommand)]
enum TrashAction {
    /// Restore every trashed record
    RestoreAll {
        /// Entity name, e.g. `product` or `order-item`
        entity: EntityKind,
    },
    /// Permanently delete every trashed record
    Purge {
        /// Entity name, e.g. `product` or `order-item`
        entity: EntityKind,

        /// Confirm the permanent deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Trash { action } => match action {
            TrashAction::RestoreAll { entity } => commands::trash::restore_all(entity).await?,
            TrashAction::Purge { entity, yes } => {
                if !yes {
                    return Err(format!(
                        "refusing to purge the {entity} trash without --yes"
                    )
                    .into());
                }
                commands::trash::purge(entity).await?;
            }
        },
        Commands::Stats { entity } => commands::trash::stats(entity).await?,
    }
    Ok(())
}
