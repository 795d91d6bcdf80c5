//! Product entity - Catalog items offered in one city or everywhere.
//!
//! `price_table` stores the unit-size → price mapping as a JSON object of
//! decimal strings; use [`Model::prices`] to read it as a
//! [`PriceTable`](crate::core::price_table::PriceTable). `price` always equals
//! the size-1 entry of that table.

use crate::core::price_table::PriceTable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// City value that makes a product visible in every city.
pub const ALL_CITIES: &str = "All";

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Price of one unit of size 1, derived from the price table on write
    pub price: Decimal,
    /// Serialized price table (`{"1":"100","2":"180"}`)
    #[sea_orm(column_type = "Text")]
    pub price_table: String,
    /// Free-form description shown on the product card
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Units left; never negative
    pub stock: i32,
    /// Category the product is listed under
    pub category: String,
    /// City the product is sold in, or [`ALL_CITIES`]
    pub city: String,
    /// Hidden from the catalog when false
    pub is_active: bool,
    /// Optional photo reference shown on the product card
    pub image_url: Option<String>,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Parses the stored price table.
    ///
    /// # Errors
    /// Returns an error if the column does not hold a valid table.
    pub fn prices(&self) -> crate::errors::Result<PriceTable> {
        PriceTable::from_json(&self.price_table)
    }

    /// Whether users in `city` can see this product.
    #[must_use]
    pub fn is_sold_in(&self, city: &str) -> bool {
        self.city == city || self.city == ALL_CITIES
    }
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Products sit in many carts
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
