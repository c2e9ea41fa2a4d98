//! Shopping cart lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;
use tracing::{info, instrument};

use ecommerce_core::{CartId, Page, PageRequest, ProductId, RecordId, UserId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// One product in a user's cart, with a snapshot of its display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub quantity: i32,
    /// Shipping weight in grams.
    pub weight: i32,
}

#[derive(Debug, FromRow)]
struct CartRow {
    user_id: i32,
    product_id: i32,
    name: String,
    price: Decimal,
    image: Option<String>,
    quantity: i32,
    weight: i32,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price: row.price,
            image: row.image,
            quantity: row.quantity,
            weight: row.weight,
        }
    }
}

impl Entity for Cart {
    type Id = CartId;

    const NAME: &'static str = "cart";
    const TABLE: &'static str = "carts";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "product_id",
        "name",
        "price",
        "image",
        "quantity",
        "weight",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.user_id.raw().into(),
            self.product_id.raw().into(),
            self.name.clone().into(),
            self.price.into(),
            self.image.clone().into(),
            self.quantity.into(),
            self.weight.into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(CartRow::from_row(row).map_err(RepositoryError::decode)?.into())
    }

    fn search_values(&self, _id: CartId) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::UserId => Some(self.user_id.raw().into()),
            Key::ProductId => Some(self.product_id.raw().into()),
            Key::Name => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.quantity <= 0 {
            return Err("quantity must be positive".to_string());
        }
        Ok(())
    }
}

impl EntityStore<Cart> {
    /// Page through the Active cart lines of `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_user(
        &self,
        user: UserId,
        request: &PageRequest,
    ) -> Result<Page<Record<Cart>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::UserId, user.raw()),
            request,
        )
        .await
    }

    /// Permanently delete several cart lines at once, typically after checkout.
    ///
    /// Either every listed line is deleted or none is. Duplicate ids count once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` naming the first id that does not
    /// exist or is not deletable under the store's policy.
    #[instrument(skip(self, ids), fields(entity = Cart::NAME, count = ids.len()))]
    pub async fn delete_many(&self, ids: &[CartId]) -> Result<u64, RepositoryError> {
        let deleted = self.backend().delete_many(ids, self.policy()).await?;
        info!(deleted, "deleted cart lines");
        Ok(deleted)
    }
}
