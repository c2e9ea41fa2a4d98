//! Merchants selling through the platform.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{MerchantId, MerchantStatus, Page, PageRequest, RecordId, UserId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// A merchant profile owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    /// Owning user.
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub address: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub status: MerchantStatus,
}

#[derive(Debug, FromRow)]
struct MerchantRow {
    user_id: i32,
    name: String,
    description: String,
    address: String,
    contact_email: String,
    contact_phone: String,
    status: String,
}

impl TryFrom<MerchantRow> for Merchant {
    type Error = RepositoryError;

    fn try_from(row: MerchantRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<MerchantStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            user_id: UserId::new(row.user_id),
            name: row.name,
            description: row.description,
            address: row.address,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            status,
        })
    }
}

impl Entity for Merchant {
    type Id = MerchantId;

    const NAME: &'static str = "merchant";
    const TABLE: &'static str = "merchants";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "name",
        "description",
        "address",
        "contact_email",
        "contact_phone",
        "status",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "contact_email", "status"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.user_id.raw().into(),
            self.name.clone().into(),
            self.description.clone().into(),
            self.address.clone().into(),
            self.contact_email.clone().into(),
            self.contact_phone.clone().into(),
            self.status.as_str().into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        MerchantRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .try_into()
    }

    fn search_values(&self, _id: MerchantId) -> Vec<String> {
        vec![
            self.name.clone(),
            self.contact_email.clone(),
            self.status.to_string(),
        ]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::UserId => Some(self.user_id.raw().into()),
            Key::Name => Some(self.name.clone().into()),
            _ => None,
        }
    }
}

impl EntityStore<Merchant> {
    /// Page through the Active merchants owned by `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_user(
        &self,
        user: UserId,
        request: &PageRequest,
    ) -> Result<Page<Record<Merchant>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::UserId, user.raw()),
            request,
        )
        .await
    }
}
