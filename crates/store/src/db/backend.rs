//! The contract every persistence backend implements.
//!
//! A backend owns one table per entity and offers point lookups, filtered and
//! windowed scans, inserts, atomic read-modify-write, lifecycle transitions
//! and bulk transitions. Stores never touch storage any other way.

use async_trait::async_trait;
use rust_decimal::Decimal;

use ecommerce_core::{BulkTransition, DeletePolicy, LifecycleState, PageRequest, TransitionRejected};

use super::RepositoryError;
use crate::record::{Entity, Record};

/// In-place change applied to a record's business fields.
pub type Patch<E> = Box<dyn FnOnce(&mut E) + Send>;

/// A column value as written to or compared against storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Text(String),
    OptText(Option<String>),
    Decimal(Decimal),
}

impl Value {
    /// Lookup equality: text compares case-insensitively, everything else exactly.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => self == other,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        Self::OptText(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

/// Columns that entity-specific lookups filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    UserId,
    RoleId,
    OrderId,
    MerchantId,
    CategoryId,
    ProductId,
    Email,
    Name,
}

impl Key {
    /// Column holding the key.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::RoleId => "role_id",
            Self::OrderId => "order_id",
            Self::MerchantId => "merchant_id",
            Self::CategoryId => "category_id",
            Self::ProductId => "product_id",
            Self::Email => "email",
            Self::Name => "name",
        }
    }
}

/// Which lifecycle states a scan returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    All,
    Active,
    Trashed,
}

impl Visibility {
    #[must_use]
    pub const fn admits(self, state: LifecycleState) -> bool {
        match self {
            Self::All => true,
            Self::Active => matches!(state, LifecycleState::Active),
            Self::Trashed => matches!(state, LifecycleState::Trashed),
        }
    }
}

impl From<LifecycleState> for Visibility {
    fn from(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Active => Self::Active,
            LifecycleState::Trashed => Self::Trashed,
        }
    }
}

/// Predicate for scans: lifecycle visibility, search term and key equalities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub visibility: Visibility,
    /// Case-insensitive substring over the entity's search columns; empty matches all.
    pub search: String,
    /// Conjunction of key equalities.
    pub keys: Vec<(Key, Value)>,
}

impl Filter {
    #[must_use]
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn search(mut self, search: &str) -> Self {
        search.clone_into(&mut self.search);
        self
    }

    #[must_use]
    pub fn key(mut self, key: Key, value: impl Into<Value>) -> Self {
        self.keys.push((key, value.into()));
        self
    }
}

/// Slice of an ordered scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl From<&PageRequest> for Window {
    fn from(request: &PageRequest) -> Self {
        Self {
            offset: request.offset(),
            limit: request.page_size(),
        }
    }
}

/// Result of a single-record lifecycle transition.
#[derive(Debug, Clone)]
pub enum TransitionOutcome<E: Entity> {
    /// No record with that id exists.
    Missing,
    /// The record exists but its state does not allow the transition.
    Rejected(TransitionRejected),
    /// The record still exists; carries its state after the transition.
    Kept(Record<E>),
    /// The record was removed.
    Removed,
}

/// Storage operations for one entity's table.
///
/// Every method is a single unit of work: it either completes or leaves the
/// table untouched, including when its future is dropped mid-way.
#[async_trait]
pub trait RecordBackend<E: Entity>: Send + Sync {
    /// Point lookup by id, in any lifecycle state.
    async fn fetch(&self, id: E::Id) -> Result<Option<Record<E>>, RepositoryError>;

    /// Records matching `filter` ordered by `created_at`, then `id`, and the
    /// number of matches before `window` is applied.
    async fn scan(
        &self,
        filter: &Filter,
        window: Option<Window>,
    ) -> Result<(Vec<Record<E>>, u64), RepositoryError>;

    /// Insert a new Active record with a generated id.
    async fn insert(&self, fields: E) -> Result<Record<E>, RepositoryError>;

    /// Apply `patch` to the record's fields atomically and refresh `updated_at`.
    /// `None` if the record does not exist.
    async fn modify(
        &self,
        id: E::Id,
        patch: Patch<E>,
    ) -> Result<Option<Record<E>>, RepositoryError>;

    /// Run a lifecycle transition while holding the record's write lock.
    async fn transition(
        &self,
        id: E::Id,
        transition: ecommerce_core::Transition,
        policy: DeletePolicy,
    ) -> Result<TransitionOutcome<E>, RepositoryError>;

    /// Apply a bulk transition to every Trashed record in one atomic step.
    /// Returns how many records changed.
    async fn bulk_transition(&self, bulk: BulkTransition) -> Result<u64, RepositoryError>;

    /// Permanently delete every listed record, or none of them if any id is
    /// missing or not deletable under `policy`.
    async fn delete_many(&self, ids: &[E::Id], policy: DeletePolicy)
    -> Result<u64, RepositoryError>;

    /// Sum of [`Entity::line_total`] over matching records; zero when none match.
    async fn sum_line_totals(&self, filter: &Filter) -> Result<Decimal, RepositoryError>;
}
