//! E-commerce core - shared domain types.
//!
//! This crate provides the types shared by the repository layer and its callers:
//! - `store` - Persistence contract, backends and entity stores
//! - `cli` - Operator tooling (migrations, seeding, trash maintenance)
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database access.
//! The record lifecycle state machine and page normalization live here so that
//! every backend applies exactly the same rules.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, statuses, lifecycle states and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
