//! Payment transactions for orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{MerchantId, OrderId, Page, PageRequest, PaymentStatus, RecordId, TransactionId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// A payment made against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub order_id: OrderId,
    pub merchant_id: MerchantId,
    pub payment_method: String,
    pub amount: Decimal,
    /// Change handed back for cash payments.
    pub change_amount: Decimal,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    order_id: i32,
    merchant_id: i32,
    payment_method: String,
    amount: Decimal,
    change_amount: Decimal,
    payment_status: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = RepositoryError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let payment_status = row
            .payment_status
            .parse::<PaymentStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            order_id: OrderId::new(row.order_id),
            merchant_id: MerchantId::new(row.merchant_id),
            payment_method: row.payment_method,
            amount: row.amount,
            change_amount: row.change_amount,
            payment_status,
        })
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    const NAME: &'static str = "transaction";
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "merchant_id",
        "payment_method",
        "amount",
        "change_amount",
        "payment_status",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["payment_method", "payment_status"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.order_id.raw().into(),
            self.merchant_id.raw().into(),
            self.payment_method.clone().into(),
            self.amount.into(),
            self.change_amount.into(),
            self.payment_status.as_str().into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        TransactionRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .try_into()
    }

    fn search_values(&self, _id: TransactionId) -> Vec<String> {
        vec![
            self.payment_method.clone(),
            self.payment_status.to_string(),
        ]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::OrderId => Some(self.order_id.raw().into()),
            Key::MerchantId => Some(self.merchant_id.raw().into()),
            _ => None,
        }
    }
}

impl EntityStore<Transaction> {
    /// Page through the Active transactions of `merchant`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_merchant(
        &self,
        merchant: MerchantId,
        request: &PageRequest,
    ) -> Result<Page<Record<Transaction>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::MerchantId, merchant.raw()),
            request,
        )
        .await
    }

    /// The oldest Active transaction recorded for `order`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_order(
        &self,
        order: OrderId,
    ) -> Result<Option<Record<Transaction>>, RepositoryError> {
        self.first(&Filter::new(Visibility::Active).key(Key::OrderId, order.raw()))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecommerce_core::DeletePolicy;

    use super::*;

    fn payment(order: i32, method: &str, status: PaymentStatus) -> Transaction {
        Transaction {
            order_id: OrderId::new(order),
            merchant_id: MerchantId::new(1),
            payment_method: method.to_owned(),
            amount: Decimal::new(5_000, 2),
            change_amount: Decimal::ZERO,
            payment_status: status,
        }
    }

    #[tokio::test]
    async fn test_find_by_order() {
        let store = EntityStore::<Transaction>::in_memory(DeletePolicy::AnyState);
        let paid = store
            .create(payment(3, "card", PaymentStatus::Success))
            .await
            .unwrap();

        let found = store.find_by_order(OrderId::new(3)).await.unwrap().unwrap();
        assert_eq!(found.id, paid.id);
        assert!(store.find_by_order(OrderId::new(4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_by_status_and_method() {
        let store = EntityStore::<Transaction>::in_memory(DeletePolicy::AnyState);
        store.create(payment(1, "card", PaymentStatus::Success)).await.unwrap();
        store.create(payment(2, "cash", PaymentStatus::Refunded)).await.unwrap();
        store.create(payment(3, "Cash", PaymentStatus::Pending)).await.unwrap();

        let request = PageRequest::new("CASH", 1, 10);
        let page = store
            .find_by_merchant(MerchantId::new(1), &request)
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let refunded = store
            .find_all(&PageRequest::new("refund", 1, 10))
            .await
            .unwrap();
        assert_eq!(refunded.items[0].order_id, OrderId::new(2));
    }
}
