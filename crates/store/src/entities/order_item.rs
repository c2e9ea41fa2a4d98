//! Order line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{OrderId, OrderItemId, ProductId, RecordId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// One product line of an order, priced at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price.
    pub price: Decimal,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            price: row.price,
        }
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    const NAME: &'static str = "order_item";
    const TABLE: &'static str = "order_items";
    const COLUMNS: &'static [&'static str] = &["order_id", "product_id", "quantity", "price"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["CAST(order_id AS TEXT)"];
    const LINE_TOTAL_SQL: Option<&'static str> = Some("price * quantity");

    fn values(&self) -> Vec<Value> {
        vec![
            self.order_id.raw().into(),
            self.product_id.raw().into(),
            self.quantity.into(),
            self.price.into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(OrderItemRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .into())
    }

    fn search_values(&self, _id: OrderItemId) -> Vec<String> {
        vec![self.order_id.to_string()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::OrderId => Some(self.order_id.raw().into()),
            Key::ProductId => Some(self.product_id.raw().into()),
            _ => None,
        }
    }

    fn line_total(&self) -> Option<Decimal> {
        Some(self.price * Decimal::from(self.quantity))
    }

    fn validate(&self) -> Result<(), String> {
        if self.quantity <= 0 {
            return Err("quantity must be positive".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("price must not be negative".to_string());
        }
        Ok(())
    }
}

impl EntityStore<OrderItem> {
    /// Active line items of `order`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_order(
        &self,
        order: OrderId,
    ) -> Result<Vec<Record<OrderItem>>, RepositoryError> {
        self.list(&Filter::new(Visibility::Active).key(Key::OrderId, order.raw()))
            .await
    }

    /// Sum of `price * quantity` over the Active items of `order`; zero when
    /// it has none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn calculate_total_price(&self, order: OrderId) -> Result<Decimal, RepositoryError> {
        self.backend()
            .sum_line_totals(&Filter::new(Visibility::Active).key(Key::OrderId, order.raw()))
            .await
    }
}
