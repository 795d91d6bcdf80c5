//! Order business logic - checkout snapshots, status pipeline, delivery data.
//!
//! An order copies name, size, quantity and unit price of every cart line at
//! checkout. Totals are never recomputed from live products afterwards.

use crate::{
    core::cart,
    entities::{Order, OrderItem, OrderStatus, order, order_item},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};

/// An order together with its lines
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

impl OrderDetails {
    /// Whether `lines` still hold every unit of this order. An order whose
    /// units were already settled by another payment, or released from the
    /// cart, is not.
    #[must_use]
    pub fn is_reserved_by(&self, lines: &[cart::CartLine]) -> bool {
        self.items.iter().all(|item| {
            let Some(product_id) = item.product_id else {
                return false;
            };
            let held: i64 = lines
                .iter()
                .filter(|line| {
                    line.item.product_id == product_id && line.item.unit_size == item.unit_size
                })
                .map(|line| i64::from(line.item.quantity))
                .sum();
            held >= i64::from(item.quantity)
        })
    }
}

/// Creates a pending order from a user's current cart.
///
/// The cart itself is left untouched; it is cleared only once payment is
/// confirmed.
///
/// # Errors
/// Returns [`Error::EmptyCart`] before writing anything if the cart is empty,
/// or an input error if the address is blank.
pub async fn create_order_from_cart(
    db: &DatabaseConnection,
    user_id: i64,
    address: &str,
) -> Result<OrderDetails> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::invalid_input("Delivery address cannot be empty"));
    }

    let lines = cart::cart_lines(db, user_id).await?;
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    let txn = db.begin().await?;
    let now = chrono::Utc::now();

    let order = order::ActiveModel {
        user_id: Set(user_id),
        status: Set(OrderStatus::Pending),
        total_amount: Set(cart::cart_total(&lines)),
        delivery_address: Set(address.to_string()),
        delivery_photo: Set(None),
        delivery_comment: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(Some(line.product.id)),
            product_name: Set(line.product.name.clone()),
            unit_size: Set(line.item.unit_size),
            quantity: Set(line.item.quantity),
            unit_price: Set(line.unit_price()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;
    tracing::info!(order_id = order.id, user_id, "Order created");
    Ok(OrderDetails { order, items })
}

/// Retrieves an order by id.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id).one(db).await.map_err(Into::into)
}

/// Retrieves an order by id or fails with [`Error::OrderNotFound`].
pub async fn require_order(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    get_order(db, order_id)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })
}

/// Retrieves an order that must belong to `user_id`. Someone else's order is
/// reported as not found.
pub async fn require_user_order(
    db: &DatabaseConnection,
    user_id: i64,
    order_id: i64,
) -> Result<order::Model> {
    let order = require_order(db, order_id).await?;
    if order.user_id != user_id {
        return Err(Error::OrderNotFound { id: order_id });
    }
    Ok(order)
}

/// An order with its lines.
pub async fn order_details(db: &DatabaseConnection, order_id: i64) -> Result<OrderDetails> {
    let order = require_order(db, order_id).await?;
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;
    Ok(OrderDetails { order, items })
}

/// A user's most recent orders, newest first.
pub async fn user_orders(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A user's most recent orders that are still open (not cancelled).
pub async fn open_user_orders(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Status.ne(OrderStatus::Cancelled))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The user's newest pending order.
pub async fn latest_pending_order(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Status.eq(OrderStatus::Pending))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Orders with `status` (or all orders), newest first.
pub async fn orders_by_status(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
    limit: u64,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of orders, optionally restricted to one status.
pub async fn count_orders(db: &DatabaseConnection, status: Option<OrderStatus>) -> Result<u64> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query.count(db).await.map_err(Into::into)
}

/// Sum of the totals of delivered and completed orders.
pub async fn revenue(db: &DatabaseConnection) -> Result<Decimal> {
    let totals: Vec<Decimal> = Order::find()
        .select_only()
        .column(order::Column::TotalAmount)
        .filter(
            order::Column::Status
                .is_in(OrderStatus::ALL.into_iter().filter(|status| status.is_revenue())),
        )
        .into_tuple()
        .all(db)
        .await?;
    Ok(totals.into_iter().sum())
}

/// Moves an order to `status`.
///
/// Only forward moves along the pipeline are accepted, and cancellation only
/// from `Pending` (see [`OrderStatus::can_become`]).
///
/// # Errors
/// Returns [`Error::InvalidStatusTransition`] for any other move; the stored
/// status is left unchanged.
pub async fn set_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    let current = require_order(db, order_id).await?;
    if !current.status.can_become(status) {
        return Err(Error::InvalidStatusTransition {
            from: current.status,
            to: status,
        });
    }

    let mut active: order::ActiveModel = current.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(db).await?;
    tracing::info!(order_id, status = %status, "Order status changed");
    Ok(updated)
}

/// Cancels a user's own pending order.
///
/// # Errors
/// Returns [`Error::OrderNotFound`] for someone else's order and
/// [`Error::InvalidStatusTransition`] if the order is no longer pending.
pub async fn cancel_order(
    db: &DatabaseConnection,
    user_id: i64,
    order_id: i64,
) -> Result<order::Model> {
    require_user_order(db, user_id, order_id).await?;
    set_status(db, order_id, OrderStatus::Cancelled).await
}

/// Stores the delivery photo and comment on an order.
pub async fn attach_delivery(
    db: &DatabaseConnection,
    order_id: i64,
    photo: &str,
    comment: &str,
) -> Result<order::Model> {
    let mut active: order::ActiveModel = require_order(db, order_id).await?.into();
    active.delivery_photo = Set(Some(photo.to_string()));
    active.delivery_comment = Set(Some(comment.to_string()));
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{cart::add_to_cart, catalog, token::ProductField};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_empty_cart_creates_no_order() -> Result<()> {
        let (db, user, _product) = setup_with_product().await?;

        let result = create_order_from_cart(&db, user.id, "Main street 1").await;
        assert!(matches!(result.unwrap_err(), Error::EmptyCart));
        assert_eq!(count_orders(&db, None).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_blank_address_rejected() -> Result<()> {
        let (db, user, product) = setup_with_product().await?;
        add_to_cart(&db, user.id, product.id, Decimal::ONE, 1).await?;

        let result = create_order_from_cart(&db, user.id, "   ").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_order_snapshot_survives_product_edits() -> Result<()> {
        let (db, user, product) = setup_with_product().await?;
        add_to_cart(&db, user.id, product.id, Decimal::TWO, 2).await?;

        let details = create_order_from_cart(&db, user.id, "Main street 1").await?;
        assert_eq!(details.order.total_amount, Decimal::from(360));
        assert_eq!(details.order.status, OrderStatus::Pending);
        assert_eq!(details.items.len(), 1);

        catalog::update_product_field(&db, product.id, ProductField::Prices, "1:100, 2:999")
            .await?;
        catalog::update_product_field(&db, product.id, ProductField::Name, "Renamed").await?;

        let reloaded = order_details(&db, details.order.id).await?;
        assert_eq!(reloaded.order.total_amount, Decimal::from(360));
        assert_eq!(reloaded.items[0].product_name, "Widget");
        assert_eq!(reloaded.items[0].unit_price, Decimal::from(180));
        assert_eq!(reloaded.items[0].line_total(), Decimal::from(360));

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_keeps_cart() -> Result<()> {
        let (db, user, product) = setup_with_product().await?;
        add_to_cart(&db, user.id, product.id, Decimal::ONE, 1).await?;
        create_order_from_cart(&db, user.id, "Main street 1").await?;

        assert_eq!(cart::cart_lines(&db, user.id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_only_while_pending() -> Result<()> {
        let (db, user, order) = setup_with_order().await?;

        set_status(&db, order.id, OrderStatus::Confirmed).await?;
        set_status(&db, order.id, OrderStatus::Shipped).await?;

        let result = cancel_order(&db, user.id, order.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled
            }
        ));
        assert_eq!(require_order(&db, order.id).await?.status, OrderStatus::Shipped);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_pending_order() -> Result<()> {
        let (db, user, order) = setup_with_order().await?;

        let cancelled = cancel_order(&db, user.id, order.id).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(latest_pending_order(&db, user.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_cannot_cancel_someone_elses_order() -> Result<()> {
        let (db, _user, order) = setup_with_order().await?;

        let result = cancel_order(&db, 999, order.id).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { .. }));
        assert_eq!(require_order(&db, order.id).await?.status, OrderStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn test_status_moves_forward_only() -> Result<()> {
        let (db, _user, order) = setup_with_order().await?;

        set_status(&db, order.id, OrderStatus::Delivered).await?;
        let result = set_status(&db, order.id, OrderStatus::Confirmed).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_filters_and_revenue() -> Result<()> {
        let (db, user, first) = setup_with_order().await?;
        let product = catalog::create_product(&db, new_product("Gadget", "tea", "Moscow")).await?;
        add_to_cart(&db, user.id, product.id, Decimal::ONE, 1).await?;
        let second = create_order_from_cart(&db, user.id, "Second street").await?.order;

        set_status(&db, first.id, OrderStatus::Delivered).await?;

        assert_eq!(count_orders(&db, None).await?, 2);
        assert_eq!(count_orders(&db, Some(OrderStatus::Pending)).await?, 1);
        let pending = orders_by_status(&db, Some(OrderStatus::Pending), 10).await?;
        assert_eq!(pending[0].id, second.id);
        assert_eq!(revenue(&db).await?, first.total_amount);
        assert_eq!(
            latest_pending_order(&db, user.id).await?.map(|o| o.id),
            Some(second.id)
        );
        assert_eq!(user_orders(&db, user.id, 10).await?[0].id, second.id);

        set_status(&db, second.id, OrderStatus::Confirmed).await?;
        assert_eq!(revenue(&db).await?, first.total_amount);
        set_status(&db, second.id, OrderStatus::Completed).await?;
        assert_eq!(revenue(&db).await?, first.total_amount + second.total_amount);

        Ok(())
    }

    #[tokio::test]
    async fn test_order_is_reserved_by_its_cart() -> Result<()> {
        let (db, user, order) = setup_with_order().await?;
        let details = order_details(&db, order.id).await?;

        assert!(details.is_reserved_by(&cart::cart_lines(&db, user.id).await?));

        cart::clear_sold_cart(&db, user.id).await?;
        assert!(!details.is_reserved_by(&cart::cart_lines(&db, user.id).await?));
        Ok(())
    }

    #[tokio::test]
    async fn test_attach_delivery() -> Result<()> {
        let (db, _user, order) = setup_with_order().await?;

        let updated = attach_delivery(&db, order.id, "https://cdn/p.jpg", "At the door").await?;
        assert_eq!(updated.delivery_photo.as_deref(), Some("https://cdn/p.jpg"));
        assert_eq!(updated.delivery_comment.as_deref(), Some("At the door"));

        Ok(())
    }
}
