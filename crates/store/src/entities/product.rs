//! Catalog products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::{CategoryId, MerchantId, Page, PageRequest, ProductId, RecordId};

use crate::db::{Filter, Key, RepositoryError, Value, Visibility};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// A product listed by a merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub merchant_id: MerchantId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub count_in_stock: i32,
    pub brand: String,
    /// Shipping weight in grams.
    pub weight: i32,
    /// URL slug; unique.
    pub slug_product: String,
    pub image_product: Option<String>,
    pub barcode: Option<String>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    merchant_id: i32,
    category_id: i32,
    name: String,
    description: String,
    price: Decimal,
    count_in_stock: i32,
    brand: String,
    weight: i32,
    slug_product: String,
    image_product: Option<String>,
    barcode: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            merchant_id: MerchantId::new(row.merchant_id),
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            description: row.description,
            price: row.price,
            count_in_stock: row.count_in_stock,
            brand: row.brand,
            weight: row.weight,
            slug_product: row.slug_product,
            image_product: row.image_product,
            barcode: row.barcode,
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    const NAME: &'static str = "product";
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &[
        "merchant_id",
        "category_id",
        "name",
        "description",
        "price",
        "count_in_stock",
        "brand",
        "weight",
        "slug_product",
        "image_product",
        "barcode",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "brand", "slug_product"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.merchant_id.raw().into(),
            self.category_id.raw().into(),
            self.name.clone().into(),
            self.description.clone().into(),
            self.price.into(),
            self.count_in_stock.into(),
            self.brand.clone().into(),
            self.weight.into(),
            self.slug_product.clone().into(),
            self.image_product.clone().into(),
            self.barcode.clone().into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(ProductRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .into())
    }

    fn search_values(&self, _id: ProductId) -> Vec<String> {
        vec![
            self.name.clone(),
            self.brand.clone(),
            self.slug_product.clone(),
        ]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::MerchantId => Some(self.merchant_id.raw().into()),
            Key::CategoryId => Some(self.category_id.raw().into()),
            Key::Name => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("products_slug_product_key", self.slug_product.clone())]
    }

    fn validate(&self) -> Result<(), String> {
        if self.count_in_stock < 0 {
            return Err("count_in_stock must not be negative".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("price must not be negative".to_string());
        }
        Ok(())
    }
}

impl EntityStore<Product> {
    /// Page through the Active products of `merchant`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_merchant(
        &self,
        merchant: MerchantId,
        request: &PageRequest,
    ) -> Result<Page<Record<Product>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::MerchantId, merchant.raw()),
            request,
        )
        .await
    }

    /// Page through the Active products in `category`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn find_by_category(
        &self,
        category: CategoryId,
        request: &PageRequest,
    ) -> Result<Page<Record<Product>>, RepositoryError> {
        self.page(
            Filter::new(Visibility::Active).key(Key::CategoryId, category.raw()),
            request,
        )
        .await
    }

    /// Set the stock count of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist, or
    /// `RepositoryError::Validation` if `count` is negative.
    pub async fn update_stock(
        &self,
        product: ProductId,
        count: i32,
    ) -> Result<Record<Product>, RepositoryError> {
        self.modify(
            product,
            Box::new(move |fields: &mut Product| fields.count_in_stock = count),
        )
        .await
    }
}
