//! E-commerce store - entity lifecycle and pagination repositories.
//!
//! Every entity (users, roles, products, orders, ...) shares one contract:
//! paged and searchable listings, create and update, and a soft-delete
//! lifecycle of trash, restore and permanent delete, plus bulk restore and
//! purge of the trash.
//!
//! # Architecture
//!
//! ```text
//! Repositories ──▶ EntityStore<E> ──▶ dyn RecordBackend<E> ──▶ PgBackend / MemoryBackend
//! ```
//!
//! - [`Repositories`] - one store per entity plus cross-entity operations
//! - [`EntityStore`] - the generic operations, and entity-specific queries as
//!   inherent impls
//! - [`db::RecordBackend`] - the storage contract both backends implement
//!
//! Lifecycle rules and page normalization come from `ecommerce-core`, so both
//! backends apply them identically.
//!
//! # Example
//!
//! ```
//! use ecommerce_core::{DeletePolicy, PageRequest};
//! use ecommerce_store::{Repositories, entities::Role};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ecommerce_store::RepositoryError> {
//! let repos = Repositories::in_memory(DeletePolicy::AnyState);
//! let admin = repos.roles().create(Role::new("admin")).await?;
//! repos.roles().trash(admin.id).await?;
//!
//! let trashed = repos.roles().find_trashed(&PageRequest::first()).await?;
//! assert_eq!(trashed.total, 1);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod entities;
pub mod record;
pub mod registry;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use db::RepositoryError;
pub use record::{Entity, Record};
pub use registry::{EntityKind, EntityStats, Repositories};
pub use store::EntityStore;
