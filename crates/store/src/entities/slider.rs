//! Homepage slider banners.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use ecommerce_core::SliderId;

use crate::db::{Key, RepositoryError, Value};
use crate::record::Entity;

/// A banner shown in the homepage slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slider {
    pub name: String,
    /// Image path or URL.
    pub image: String,
}

#[derive(Debug, FromRow)]
struct SliderRow {
    name: String,
    image: String,
}

impl Entity for Slider {
    type Id = SliderId;

    const NAME: &'static str = "slider";
    const TABLE: &'static str = "sliders";
    const COLUMNS: &'static [&'static str] = &["name", "image"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];

    fn values(&self) -> Vec<Value> {
        vec![self.name.clone().into(), self.image.clone().into()]
    }

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        let row = SliderRow::from_row(row).map_err(RepositoryError::decode)?;
        Ok(Self {
            name: row.name,
            image: row.image,
        })
    }

    fn search_values(&self, _id: SliderId) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn key(&self, key: Key) -> Option<Value> {
        match key {
            Key::Name => Some(self.name.clone().into()),
            _ => None,
        }
    }
}
