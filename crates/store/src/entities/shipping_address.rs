//! Shipping addresses, one per order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{OrderId, RecordId, ShippingAddressId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// Where and how an order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Unique: an order has at most one shipping address.
    pub order_id: OrderId,
    pub address: String,
    pub province: String,
    pub city: String,
    pub country: String,
    pub courier: String,
    pub shipping_method: String,
    pub shipping_cost: Decimal,
}

#[derive(Debug, FromRow)]
struct ShippingAddressRow {
    order_id: i32,
    address: String,
    province: String,
    city: String,
    country: String,
    courier: String,
    shipping_method: String,
    shipping_cost: Decimal,
}

impl From<ShippingAddressRow> for ShippingAddress {
    fn from(row: ShippingAddressRow) -> Self {
        Self {
            order_id: OrderId::new(row.order_id),
            address: row.address,
            province: row.province,
            city: row.city,
            country: row.country,
            courier: row.courier,
            shipping_method: row.shipping_method,
            shipping_cost: row.shipping_cost,
        }
    }
}

impl Entity for ShippingAddress {
    type Id = ShippingAddressId;

    const NAME: &'static str = "shipping_address";
    const TABLE: &'static str = "shipping_addresses";
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "address",
        "province",
        "city",
        "country",
        "courier",
        "shipping_method",
        "shipping_cost",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["address", "city", "courier"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.order_id.raw().into(),
            self.address.clone().into(),
            self.province.clone().into(),
            self.city.clone().into(),
            self.country.clone().into(),
            self.courier.clone().into(),
            self.shipping_method.clone().into(),
            self.shipping_cost.into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(ShippingAddressRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .into())
    }

    fn search_values(&self, _id: ShippingAddressId) -> Vec<String> {
        vec![
            self.address.clone(),
            self.city.clone(),
            self.courier.clone(),
        ]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::OrderId => Some(self.order_id.raw().into()),
            _ => None,
        }
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("shipping_addresses_order_id_key", self.order_id.to_string())]
    }
}

impl EntityStore<ShippingAddress> {
    /// The Active shipping address of `order`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_order(
        &self,
        order: OrderId,
    ) -> Result<Option<Record<ShippingAddress>>, RepositoryError> {
        self.first(&Filter::new(Visibility::Active).key(Key::OrderId, order.raw()))
            .await
    }
}
