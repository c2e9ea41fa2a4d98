//! Assignments of roles to users.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{RecordId, RoleId, UserId, UserRoleId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// One role granted to one user. A user holds each role at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: i32,
    role_id: i32,
}

impl From<UserRoleRow> for UserRole {
    fn from(row: UserRoleRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            role_id: RoleId::new(row.role_id),
        }
    }
}

impl Entity for UserRole {
    type Id = UserRoleId;

    const NAME: &'static str = "user_role";
    const TABLE: &'static str = "user_roles";
    const COLUMNS: &'static [&'static str] = &["user_id", "role_id"];
    const SEARCH_COLUMNS: &'static [&'static str] =
        &["CAST(user_id AS TEXT)", "CAST(role_id AS TEXT)"];

    fn values(&self) -> Vec<Value> {
        vec![self.user_id.raw().into(), self.role_id.raw().into()]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(UserRoleRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .into())
    }

    fn search_values(&self, _id: UserRoleId) -> Vec<String> {
        vec![self.user_id.to_string(), self.role_id.to_string()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::UserId => Some(self.user_id.raw().into()),
            Key::RoleId => Some(self.role_id.raw().into()),
            _ => None,
        }
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(
            "user_roles_user_id_role_id_key",
            format!("{}:{}", self.user_id, self.role_id),
        )]
    }
}

impl EntityStore<UserRole> {
    /// The Active assignment of `role` to `user`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_assignment(
        &self,
        user: UserId,
        role: RoleId,
    ) -> Result<Option<Record<UserRole>>, RepositoryError> {
        let filter = Filter::new(Visibility::Active)
            .key(Key::UserId, user.raw())
            .key(Key::RoleId, role.raw());
        self.first(&filter).await
    }

    /// Every Active assignment held by `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_user(&self, user: UserId) -> Result<Vec<Record<UserRole>>, RepositoryError> {
        self.list(&Filter::new(Visibility::Active).key(Key::UserId, user.raw()))
            .await
    }
}
