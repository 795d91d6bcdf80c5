//! Admin dashboard figures.

use crate::{
    core::{catalog, order, user},
    entities::OrderStatus,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Shop-wide counters shown on the admin stats screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShopStats {
    pub users: u64,
    pub orders: u64,
    pub pending_orders: u64,
    pub products: u64,
    pub active_products: u64,
    /// Sum of delivered and completed order totals
    pub revenue: Decimal,
}

/// Collects all dashboard figures.
pub async fn shop_stats(db: &DatabaseConnection) -> Result<ShopStats> {
    let (products, active_products) = catalog::count_products(db).await?;
    Ok(ShopStats {
        users: user::count_users(db).await?,
        orders: order::count_orders(db, None).await?,
        pending_orders: order::count_orders(db, Some(OrderStatus::Pending)).await?,
        products,
        active_products,
        revenue: order::revenue(db).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_empty_shop() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(shop_stats(&db).await?, ShopStats::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_stats_count_revenue_from_delivered_orders() -> Result<()> {
        let (db, _user, first) = setup_with_order().await?;
        order::set_status(&db, first.id, OrderStatus::Delivered).await?;

        let stats = shop_stats(&db).await?;
        assert_eq!(stats.users, 1);
        assert_eq!(stats.orders, 1);
        assert_eq!(stats.pending_orders, 0);
        assert_eq!(stats.products, 1);
        assert_eq!(stats.active_products, 1);
        assert_eq!(stats.revenue, first.total_amount);

        Ok(())
    }
}
