//! Product reviews.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{Page, PageRequest, ProductId, RecordId, ReviewId, UserId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// Lowest accepted rating.
pub const MIN_RATING: i32 = 1;

/// Highest accepted rating.
pub const MAX_RATING: i32 = 5;

/// A user's rating and comment on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: UserId,
    pub product_id: ProductId,
    /// Display name of the reviewer.
    pub name: String,
    pub comment: String,
    /// 1 to 5 stars.
    pub rating: i32,
}

#[derive(Debug, FromRow)]
struct ReviewRow {
    user_id: i32,
    product_id: i32,
    name: String,
    comment: String,
    rating: i32,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            comment: row.comment,
            rating: row.rating,
        }
    }
}

impl Entity for Review {
    type Id = ReviewId;

    const NAME: &'static str = "review";
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static [&'static str] =
        &["user_id", "product_id", "name", "comment", "rating"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "comment"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.user_id.raw().into(),
            self.product_id.raw().into(),
            self.name.clone().into(),
            self.comment.clone().into(),
            self.rating.into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(ReviewRow::from_row(row).map_err(RepositoryError::decode)?.into())
    }

    fn search_values(&self, _id: ReviewId) -> Vec<String> {
        vec![self.name.clone(), self.comment.clone()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::UserId => Some(self.user_id.raw().into()),
            Key::ProductId => Some(self.product_id.raw().into()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {}",
                self.rating
            ));
        }
        Ok(())
    }
}

impl EntityStore<Review> {
    /// Page through the Active reviews of `product`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_product(
        &self,
        product: ProductId,
        request: &PageRequest,
    ) -> Result<Page<Record<Review>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::ProductId, product.raw()),
            request,
        )
        .await
    }

    /// Page through the Active reviews written by `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_user(
        &self,
        user: UserId,
        request: &PageRequest,
    ) -> Result<Page<Record<Review>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::UserId, user.raw()),
            request,
        )
        .await
    }
}
