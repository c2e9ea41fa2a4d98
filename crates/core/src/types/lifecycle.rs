//! Record lifecycle state machine.
//!
//! Every record is either Active or Trashed while it exists. Deleted is
//! terminal and is represented by the record's absence, so it has no variant
//! here: a backend that cannot find a row reports the record as missing before
//! the state machine is ever consulted.
//!
//! ```text
//!            trash                     delete (any state, or trashed only)
//!   Active ─────────▶ Trashed ──────────────────────────────────▶ Deleted
//!     ▲                  │
//!     └──── restore ─────┘
//! ```
//!
//! Backends call [`LifecycleState::apply`] while holding whatever lock
//! serializes writers to the record, then perform the returned [`Effect`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visible lifecycle state of an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Not marked deleted; shown in default listings.
    Active,
    /// Soft-deleted; recoverable via restore.
    Trashed,
}

/// Single-record lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Trash,
    Restore,
    DeletePermanent,
}

/// Transition applied to every Trashed record of an entity at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkTransition {
    /// Every Trashed record becomes Active.
    RestoreAll,
    /// Every Trashed record is removed.
    DeleteAllPermanent,
}

/// Storage change required by an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Set `deleted_at` and refresh `updated_at`.
    MarkTrashed,
    /// Clear `deleted_at` and refresh `updated_at`.
    ClearTrashed,
    /// Remove the record.
    Remove,
    /// Nothing to write; the record is already in the target state.
    Unchanged,
}

/// Which states a permanent delete may start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Active and Trashed records can be deleted directly.
    #[default]
    AnyState,
    /// Only Trashed records can be deleted; Active records must be trashed first.
    TrashedOnly,
}

impl std::fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnyState => f.write_str("any"),
            Self::TrashedOnly => f.write_str("trashed_only"),
        }
    }
}

impl std::str::FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "any_state" => Ok(Self::AnyState),
            "trashed_only" | "trashed" => Ok(Self::TrashedOnly),
            other => Err(format!("invalid delete policy: {other}")),
        }
    }
}

/// A transition that is not allowed from the record's current state.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot {transition:?} a record that is {from:?}")]
pub struct TransitionRejected {
    /// State the record was in.
    pub from: LifecycleState,
    /// Transition that was attempted.
    pub transition: Transition,
}

impl LifecycleState {
    /// Derive the state from a record's `deleted_at` column.
    #[must_use]
    pub const fn from_deleted_at(deleted_at: Option<&DateTime<Utc>>) -> Self {
        if deleted_at.is_some() {
            Self::Trashed
        } else {
            Self::Active
        }
    }

    /// Decide what a transition does to a record in this state.
    ///
    /// Trashing a Trashed record is accepted and leaves it untouched, so two
    /// racing trash calls both succeed with the first `deleted_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionRejected`] when restoring an Active record, or when
    /// deleting an Active record under [`DeletePolicy::TrashedOnly`].
    pub const fn apply(
        self,
        transition: Transition,
        policy: DeletePolicy,
    ) -> Result<Effect, TransitionRejected> {
        match (self, transition) {
            (Self::Active, Transition::Trash) => Ok(Effect::MarkTrashed),
            (Self::Trashed, Transition::Trash) => Ok(Effect::Unchanged),
            (Self::Trashed, Transition::Restore) => Ok(Effect::ClearTrashed),
            (Self::Trashed, Transition::DeletePermanent) => Ok(Effect::Remove),
            (Self::Active, Transition::DeletePermanent) => match policy {
                DeletePolicy::AnyState => Ok(Effect::Remove),
                DeletePolicy::TrashedOnly => Err(TransitionRejected {
                    from: self,
                    transition,
                }),
            },
            (Self::Active, Transition::Restore) => Err(TransitionRejected {
                from: self,
                transition,
            }),
        }
    }
}

impl BulkTransition {
    /// Bulk transitions only ever select Trashed records.
    #[must_use]
    pub const fn source(self) -> LifecycleState {
        LifecycleState::Trashed
    }

    /// Effect applied to every selected record.
    #[must_use]
    pub const fn effect(self) -> Effect {
        match self {
            Self::RestoreAll => Effect::ClearTrashed,
            Self::DeleteAllPermanent => Effect::Remove,
        }
    }
}
