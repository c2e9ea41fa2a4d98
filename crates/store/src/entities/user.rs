//! Customer and merchant accounts.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{Email, UserId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    /// Unique, compared case-insensitively.
    pub email: Email,
    /// Password hash produced by the auth layer; never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, FromRow)]
struct UserRow {
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            password_hash: row.password_hash,
        })
    }
}

impl Entity for User {
    type Id = UserId;

    const NAME: &'static str = "user";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["first_name", "last_name", "email", "password_hash"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["first_name", "last_name", "email"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.email.as_str().into(),
            self.password_hash.clone().into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        UserRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .try_into()
    }

    fn search_values(&self, _id: UserId) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.to_string(),
        ]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::Email => Some(self.email.as_str().into()),
            _ => None,
        }
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("users_email_key", self.email.normalized())]
    }
}

impl EntityStore<User> {
    /// Find the Active user registered under `email`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<Record<User>>, RepositoryError> {
        self.first(&Filter::new(Visibility::Active).key(Key::Email, email.as_str()))
            .await
    }
}
