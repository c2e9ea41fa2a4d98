//! Orders placed with a merchant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{MerchantId, OrderId, Page, PageRequest, RecordId, UserId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// An order header. Line items live in [`crate::entities::OrderItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub merchant_id: MerchantId,
    /// Buyer.
    pub user_id: UserId,
    pub total_price: Decimal,
}

#[derive(Debug, FromRow)]
struct OrderRow {
    merchant_id: i32,
    user_id: i32,
    total_price: Decimal,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            merchant_id: MerchantId::new(row.merchant_id),
            user_id: UserId::new(row.user_id),
            total_price: row.total_price,
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    const NAME: &'static str = "order";
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] = &["merchant_id", "user_id", "total_price"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["CAST(id AS TEXT)"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.merchant_id.raw().into(),
            self.user_id.raw().into(),
            self.total_price.into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(OrderRow::from_row(row).map_err(RepositoryError::decode)?.into())
    }

    fn search_values(&self, id: OrderId) -> Vec<String> {
        vec![id.to_string()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::MerchantId => Some(self.merchant_id.raw().into()),
            Key::UserId => Some(self.user_id.raw().into()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.total_price.is_sign_negative() {
            return Err("total_price must not be negative".to_string());
        }
        Ok(())
    }
}

impl EntityStore<Order> {
    /// Page through the Active orders placed with `merchant`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_merchant(
        &self,
        merchant: MerchantId,
        request: &PageRequest,
    ) -> Result<Page<Record<Order>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::MerchantId, merchant.raw()),
            request,
        )
        .await
    }

    /// Overwrite the stored total of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist, or
    /// `RepositoryError::Validation` if `total` is negative.
    pub async fn set_total_price(
        &self,
        order: OrderId,
        total: Decimal,
    ) -> Result<Record<Order>, RepositoryError> {
        self.modify(order, Box::new(move |fields: &mut Order| fields.total_price = total))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecommerce_core::DeletePolicy;

    use super::*;

    fn order(merchant: i32) -> Order {
        Order {
            merchant_id: MerchantId::new(merchant),
            user_id: UserId::new(1),
            total_price: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_search_by_order_id() {
        let store = EntityStore::<Order>::in_memory(DeletePolicy::AnyState);
        for _ in 0..12 {
            store.create(order(1)).await.unwrap();
        }
        // "1" matches ids 1, 10, 11 and 12.
        let page = store.find_all(&PageRequest::new("1", 1, 10)).await.unwrap();
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_set_total_price() {
        let store = EntityStore::<Order>::in_memory(DeletePolicy::AnyState);
        let created = store.create(order(1)).await.unwrap();

        let updated = store
            .set_total_price(created.id, Decimal::new(4_250, 2))
            .await
            .unwrap();
        assert_eq!(updated.total_price, Decimal::new(4_250, 2));

        let err = store
            .set_total_price(created.id, Decimal::new(-1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));

        let missing = store
            .set_total_price(OrderId::new(404), Decimal::ONE)
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_merchant() {
        let store = EntityStore::<Order>::in_memory(DeletePolicy::AnyState);
        store.create(order(1)).await.unwrap();
        store.create(order(2)).await.unwrap();
        let trashed = store.create(order(1)).await.unwrap();
        store.trash(trashed.id).await.unwrap();

        let page = store
            .find_by_merchant(MerchantId::new(1), &PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }
}
