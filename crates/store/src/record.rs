//! Stored records and the per-entity hooks generic stores rely on.

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;
use sqlx::postgres::PgRow;

use ecommerce_core::{LifecycleState, RecordId};

use crate::db::{Key, RepositoryError, Value};

/// Business fields of one entity plus how they map onto storage.
///
/// Implementors describe their table once; [`crate::EntityStore`] and both
/// backends derive every generic operation from these hooks.
pub trait Entity: Clone + Debug + Serialize + Send + Sync + Unpin + 'static {
    /// Typed identifier of the entity.
    type Id: RecordId + Serialize;

    /// Singular name used in errors and logs, e.g. `order_item`.
    const NAME: &'static str;

    /// Table holding the entity.
    const TABLE: &'static str;

    /// Business columns, in the order [`Entity::values`] returns them.
    const COLUMNS: &'static [&'static str];

    /// SQL expressions matched by the search term.
    const SEARCH_COLUMNS: &'static [&'static str];

    /// SQL expression for one record's line total, if the entity has one.
    const LINE_TOTAL_SQL: Option<&'static str> = None;

    /// Column values in [`Entity::COLUMNS`] order.
    fn values(&self) -> Vec<Value>;

    /// Decode the business columns of a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a column cannot be decoded.
    fn from_row(row: &PgRow) -> Result<Self, RepositoryError>;

    /// In-memory counterpart of [`Entity::SEARCH_COLUMNS`].
    fn search_values(&self, id: Self::Id) -> Vec<String>;

    /// Value of a lookup key, `None` if the entity has no such column.
    fn key(&self, key: Key) -> Option<Value>;

    /// Normalized values that must be unique across the table, keyed by constraint name.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// In-memory counterpart of [`Entity::LINE_TOTAL_SQL`].
    fn line_total(&self) -> Option<Decimal> {
        None
    }

    /// Reject field values the schema's check constraints would refuse.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// An entity's fields together with its identity and lifecycle timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct Record<E: Entity> {
    pub id: E::Id,
    #[serde(flatten)]
    pub fields: E,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set while the record is in the trash.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl<E: Entity> Record<E> {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_deleted_at(self.deleted_at.as_ref())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    #[must_use]
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Drop identity and timestamps, keeping the business fields.
    #[must_use]
    pub fn into_fields(self) -> E {
        self.fields
    }

    /// Decode a row selected with [`select_list`].
    pub(crate) fn from_pg_row(row: &PgRow) -> Result<Self, RepositoryError> {
        let id: i32 = row.try_get("id").map_err(RepositoryError::decode)?;
        Ok(Self {
            id: E::Id::from_raw(id),
            fields: E::from_row(row)?,
            created_at: row.try_get("created_at").map_err(RepositoryError::decode)?,
            updated_at: row.try_get("updated_at").map_err(RepositoryError::decode)?,
            deleted_at: row.try_get("deleted_at").map_err(RepositoryError::decode)?,
        })
    }
}

impl<E: Entity> Deref for Record<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.fields
    }
}

impl<E: Entity> DerefMut for Record<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.fields
    }
}

/// Columns selected for every record of `E`.
pub(crate) fn select_list<E: Entity>() -> String {
    let mut list = String::from("id, created_at, updated_at, deleted_at");
    for column in E::COLUMNS {
        list.push_str(", ");
        list.push_str(column);
    }
    list
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::Slider;
    use ecommerce_core::SliderId;

    fn slider(deleted_at: Option<DateTime<Utc>>) -> Record<Slider> {
        let now = Utc::now();
        Record {
            id: SliderId::new(1),
            fields: Slider {
                name: "Summer".to_owned(),
                image: "summer.png".to_owned(),
            },
            created_at: now,
            updated_at: now,
            deleted_at,
        }
    }

    #[test]
    fn test_state_follows_deleted_at() {
        assert_eq!(slider(None).state(), LifecycleState::Active);
        let trashed = slider(Some(Utc::now()));
        assert_eq!(trashed.state(), LifecycleState::Trashed);
        assert!(trashed.is_trashed());
    }

    #[test]
    fn test_deref_to_fields() {
        let record = slider(None);
        assert_eq!(record.name, "Summer");
    }

    #[test]
    fn test_serialize_flattens_fields() {
        let json = serde_json::to_value(slider(None)).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Summer");
        assert!(json["deleted_at"].is_null());
    }

    #[test]
    fn test_select_list() {
        assert_eq!(
            select_list::<Slider>(),
            "id, created_at, updated_at, deleted_at, name, image"
        );
    }
}
