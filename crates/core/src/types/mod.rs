//! Core types for the e-commerce domain.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod lifecycle;
pub mod page;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use lifecycle::{BulkTransition, DeletePolicy, Effect, LifecycleState, Transition, TransitionRejected};
pub use page::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use status::*;
