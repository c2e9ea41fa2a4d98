//! Product categories.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::CategoryId;

use crate::db::{Key, RepositoryError, Value};
use crate::record::Entity;

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
    /// URL slug; unique.
    pub slug_category: String,
    pub image_category: Option<String>,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    name: String,
    description: String,
    slug_category: String,
    image_category: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            name: row.name,
            description: row.description,
            slug_category: row.slug_category,
            image_category: row.image_category,
        }
    }
}

impl Entity for Category {
    type Id = CategoryId;

    const NAME: &'static str = "category";
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] =
        &["name", "description", "slug_category", "image_category"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "slug_category"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.description.clone().into(),
            self.slug_category.clone().into(),
            self.image_category.clone().into(),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(CategoryRow::from_row(row)
            .map_err(RepositoryError::decode)?
            .into())
    }

    fn search_values(&self, _id: CategoryId) -> Vec<String> {
        vec![self.name.clone(), self.slug_category.clone()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::Name => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("categories_slug_category_key", self.slug_category.clone())]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecommerce_core::{DeletePolicy, PageRequest};

    use super::*;
    use crate::store::EntityStore;

    fn category(name: &str, slug: &str) -> Category {
        Category {
            name: name.to_owned(),
            description: String::new(),
            slug_category: slug.to_owned(),
            image_category: None,
        }
    }

    #[tokio::test]
    async fn test_slug_is_unique_even_in_trash() {
        let store = EntityStore::<Category>::in_memory(DeletePolicy::AnyState);
        let shoes = store.create(category("Shoes", "shoes")).await.unwrap();
        store.trash(shoes.id).await.unwrap();

        let err = store.create(category("Sneakers", "shoes")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search_matches_slug() {
        let store = EntityStore::<Category>::in_memory(DeletePolicy::AnyState);
        store.create(category("Shoes", "footwear")).await.unwrap();
        store.create(category("Hats", "headwear")).await.unwrap();

        let page = store.find_all(&PageRequest::new("foot", 1, 10)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Shoes");
    }
}
