//! Cart business logic - reservation-style add-to-cart, totals and clearing.
//!
//! Stock is taken at add-to-cart time, not at checkout. Removing a line or
//! clearing the cart by hand puts the units back; clearing after a confirmed
//! payment does not, because by then the units are sold.

use crate::{
    core::catalog,
    entities::{CartItem, Product, cart_item, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};

/// A cart line joined with its product
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    pub item: cart_item::Model,
    pub product: product::Model,
}

impl CartLine {
    /// Price of one unit of the line's size; the base price if the size has
    /// disappeared from the table since the line was added.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.product
            .prices()
            .ok()
            .and_then(|table| table.price_for(self.item.unit_size))
            .unwrap_or(self.product.price)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.item.quantity)
    }
}

/// Adds `quantity` units of `size` to a user's cart.
///
/// The size must be in the product's price table and the stock must cover the
/// quantity. Stock is decremented atomically and the cart line is upserted in
/// the same local transaction.
///
/// # Errors
/// Returns [`Error::UnknownUnitSize`], [`Error::InsufficientStock`],
/// [`Error::ProductNotFound`] or an input error for a non-positive quantity.
pub async fn add_to_cart(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    size: Decimal,
    quantity: i32,
) -> Result<cart_item::Model> {
    if quantity <= 0 {
        return Err(Error::invalid_input("Quantity must be positive"));
    }

    let txn = db.begin().await?;

    let product = catalog::require_product(&txn, product_id).await?;
    if !product.is_active {
        return Err(Error::ProductNotFound { id: product_id });
    }
    if !product.prices()?.contains(size) {
        return Err(Error::UnknownUnitSize { product_id, size });
    }

    catalog::reserve_stock(&txn, product_id, quantity).await?;

    let existing = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .filter(cart_item::Column::UnitSize.eq(size))
        .one(&txn)
        .await?;

    let line = if let Some(existing) = existing {
        CartItem::update_many()
            .col_expr(
                cart_item::Column::Quantity,
                Expr::col(cart_item::Column::Quantity).add(quantity),
            )
            .filter(cart_item::Column::Id.eq(existing.id))
            .exec(&txn)
            .await?;
        CartItem::find_by_id(existing.id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::Database(format!("Cart line {} vanished", existing.id)))?
    } else {
        cart_item::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            unit_size: Set(size.normalize()),
            quantity: Set(quantity),
            added_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?
    };

    txn.commit().await?;
    Ok(line)
}

/// A user's cart lines in the order they were added.
pub async fn cart_lines(db: &DatabaseConnection, user_id: i64) -> Result<Vec<CartLine>> {
    let rows = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .order_by_asc(cart_item::Column::AddedAt)
        .order_by_asc(cart_item::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|product| CartLine { item, product }))
        .collect())
}

/// Sum of all line totals.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::total).sum()
}

/// Total number of units across all lines.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> i64 {
    lines.iter().map(|line| i64::from(line.item.quantity)).sum()
}

/// Removes one line from a user's cart and returns its units to stock.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if the line does not belong to the user.
pub async fn remove_line(db: &DatabaseConnection, user_id: i64, item_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let item = CartItem::find_by_id(item_id)
        .filter(cart_item::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::invalid_input("That item is no longer in your cart"))?;

    CartItem::delete_by_id(item.id).exec(&txn).await?;
    catalog::release_stock(&txn, item.product_id, item.quantity).await?;

    txn.commit().await?;
    Ok(())
}

/// Empties a user's cart and returns every unit to stock.
pub async fn clear_cart(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    let txn = db.begin().await?;

    let items = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .all(&txn)
        .await?;
    for item in &items {
        catalog::release_stock(&txn, item.product_id, item.quantity).await?;
    }
    let result = CartItem::delete_many()
        .filter(cart_item::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(result.rows_affected)
}

/// Empties a user's cart after a confirmed payment. Stock stays sold.
pub async fn clear_sold_cart(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    let result = CartItem::delete_many()
        .filter(cart_item::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
