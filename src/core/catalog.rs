//! Catalog business logic - city-scoped browsing and product management.
//!
//! A product is visible to a user when it is active, has stock left, and is
//! sold in the user's city or in every city ([`ALL_CITIES`]). Writes always go
//! through [`PriceTable`] so the base price column stays equal to the size-1
//! entry of the table.

use crate::{
    core::{price_table::PriceTable, token::ProductField},
    entities::{CartItem, Product, cart_item, product, product::ALL_CITIES},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr,
};

/// Fields needed to create a product
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub stock: i32,
    pub category: String,
    pub city: String,
    /// Must contain size 1; see [`PriceTable::or_base_price`]
    pub prices: PriceTable,
    pub image_url: Option<String>,
}

fn visible_in(city: &str) -> Condition {
    Condition::all()
        .add(product::Column::IsActive.eq(true))
        .add(product::Column::Stock.gt(0))
        .add(
            Condition::any()
                .add(product::Column::City.eq(city))
                .add(product::Column::City.eq(ALL_CITIES)),
        )
}

fn require_text(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn require_stock(stock: i32) -> Result<i32> {
    if stock < 0 {
        return Err(Error::invalid_input("Stock cannot be negative"));
    }
    Ok(stock)
}

fn require_base_price(prices: &PriceTable) -> Result<rust_decimal::Decimal> {
    prices
        .base_price()
        .ok_or_else(|| Error::invalid_input("The price table needs an entry for size 1"))
}

/// Distinct categories with at least one visible product in `city`, sorted.
pub async fn categories_for_city(db: &DatabaseConnection, city: &str) -> Result<Vec<String>> {
    Product::find()
        .select_only()
        .column(product::Column::Category)
        .distinct()
        .filter(visible_in(city))
        .order_by_asc(product::Column::Category)
        .into_tuple::<String>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Visible products of one category in `city`, sorted by name.
pub async fn products_in_category(
    db: &DatabaseConnection,
    city: &str,
    category: &str,
) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(visible_in(city))
        .filter(product::Column::Category.eq(category))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Cities a user can pick: the configured list followed by any other city a
/// product is sold in. The sentinel [`ALL_CITIES`] is never offered.
pub async fn available_cities(db: &DatabaseConnection, configured: &[String]) -> Result<Vec<String>> {
    let product_cities: Vec<String> = Product::find()
        .select_only()
        .column(product::Column::City)
        .distinct()
        .filter(product::Column::City.ne(ALL_CITIES))
        .order_by_asc(product::Column::City)
        .into_tuple()
        .all(db)
        .await?;

    let mut cities: Vec<String> = configured
        .iter()
        .filter(|city| city.as_str() != ALL_CITIES)
        .cloned()
        .collect();
    for city in product_cities {
        if !cities.contains(&city) {
            cities.push(city);
        }
    }
    Ok(cities)
}

/// Retrieves a product by id, active or not.
pub async fn get_product(db: &DatabaseConnection, product_id: i64) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id or fails with [`Error::ProductNotFound`].
pub async fn require_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })
}

/// Every product, active or not, for the admin list.
pub async fn all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::City)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of products, and how many of them are active.
pub async fn count_products(db: &DatabaseConnection) -> Result<(u64, u64)> {
    let total = Product::find().count(db).await?;
    let active = Product::find()
        .filter(product::Column::IsActive.eq(true))
        .count(db)
        .await?;
    Ok((total, active))
}

/// Creates a product after validating every field.
///
/// # Errors
/// Returns an error if a text field is blank, stock is negative, or the price
/// table has no size-1 entry.
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    let name = require_text(&new.name, "Product name")?;
    let category = require_text(&new.category, "Category")?;
    let city = require_text(&new.city, "City")?;
    let stock = require_stock(new.stock)?;
    let price = require_base_price(&new.prices)?;

    let now = chrono::Utc::now();
    let model = product::ActiveModel {
        name: Set(name),
        price: Set(price),
        price_table: Set(new.prices.to_json()),
        description: Set(new.description.trim().to_string()),
        stock: Set(stock),
        category: Set(category),
        city: Set(city),
        is_active: Set(true),
        image_url: Set(new.image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Applies one admin-typed value to one field of a product.
///
/// Editing the price rewrites the size-1 entry of the table. Replacing the
/// table keeps the current base price as size 1 when the new list lacks it.
pub async fn update_product_field(
    db: &DatabaseConnection,
    product_id: i64,
    field: ProductField,
    input: &str,
) -> Result<product::Model> {
    let current = require_product(db, product_id).await?;
    let mut active: product::ActiveModel = current.clone().into();

    match field {
        ProductField::Name => active.name = Set(require_text(input, "Product name")?),
        ProductField::Description => active.description = Set(input.trim().to_string()),
        ProductField::Category => active.category = Set(require_text(input, "Category")?),
        ProductField::City => active.city = Set(require_text(input, "City")?),
        ProductField::Stock => {
            let stock = input
                .trim()
                .parse::<i32>()
                .map_err(|_| Error::invalid_input("Stock must be a whole number"))?;
            active.stock = Set(require_stock(stock)?);
        }
        ProductField::Price => {
            let price = crate::core::price_table::parse_positive(input)?;
            let table = current.prices()?.with_base_price(price);
            active.price = Set(price);
            active.price_table = Set(table.to_json());
        }
        ProductField::Prices => {
            let table = PriceTable::parse_list(input)?.or_base_price(current.price);
            active.price = Set(require_base_price(&table)?);
            active.price_table = Set(table.to_json());
        }
    }

    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Flips the active flag and returns the updated product.
pub async fn toggle_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let current = require_product(db, product_id).await?;
    let is_active = current.is_active;
    let mut active: product::ActiveModel = current.into();
    active.is_active = Set(!is_active);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes a product and every cart line pointing at it. Order lines keep
/// their snapshot and lose the product reference.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    use sea_orm::TransactionTrait;

    let txn = db.begin().await?;
    let existing = require_product(&txn, product_id).await?;

    CartItem::delete_many()
        .filter(cart_item::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    crate::entities::OrderItem::update_many()
        .col_expr(
            crate::entities::OrderItemColumn::ProductId,
            Expr::value(Option::<i64>::None),
        )
        .filter(crate::entities::OrderItemColumn::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    Product::delete_by_id(product_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(existing)
}

/// Atomically takes `quantity` units out of stock.
///
/// Runs `UPDATE products SET stock = stock - q WHERE id = ? AND stock >= q`,
/// so two buyers racing for the last unit cannot both succeed.
///
/// # Errors
/// Returns [`Error::InsufficientStock`] when fewer than `quantity` units are
/// left, or [`Error::ProductNotFound`] if the product does not exist.
pub async fn reserve_stock<C>(db: &C, product_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    if quantity <= 0 {
        return Err(Error::invalid_input("Quantity must be positive"));
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let product = require_product(db, product_id).await?;
        return Err(Error::InsufficientStock {
            available: product.stock,
            requested: quantity,
        });
    }
    Ok(())
}

/// Puts `quantity` units back into stock, ignoring products that no longer
/// exist.
pub async fn release_stock<C>(db: &C, product_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;
    Ok(())
}
