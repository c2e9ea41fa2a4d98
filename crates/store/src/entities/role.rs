//! Roles that can be assigned to users.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::RoleId;

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// A named role such as `admin` or `merchant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique, compared case-insensitively.
    pub name: String,
}

impl Role {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    name: String,
}

impl Entity for Role {
    type Id = RoleId;

    const NAME: &'static str = "role";
    const TABLE: &'static str = "roles";
    const COLUMNS: &'static [&'static str] = &["name"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];

    fn values(&self) -> Vec<Value> {
        vec![self.name.clone().into()]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        let row = RoleRow::from_row(row).map_err(RepositoryError::decode)?;
        Ok(Self { name: row.name })
    }

    fn search_values(&self, _id: RoleId) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::Name => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("roles_name_key", self.name.to_lowercase())]
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

impl EntityStore<Role> {
    /// Find an Active role by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Record<Role>>, RepositoryError> {
        self.first(&Filter::new(Visibility::Active).key(Key::Name, name))
            .await
    }
}
