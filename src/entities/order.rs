//! Order entity - A checked-out cart with a snapshotted total.
//!
//! Orders move forward through [`OrderStatus`]; only pending orders can be
//! cancelled. Lines live in `order_items` and keep their own copy of name and
//! price, so later catalog edits never change an order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an order
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum OrderStatus {
    /// Created at checkout, waiting for payment confirmation
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Payment accepted by an admin
    #[sea_orm(string_value = "Confirmed")]
    Confirmed,
    /// Handed to delivery
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    /// Delivered to the client
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    /// Closed
    #[sea_orm(string_value = "Completed")]
    Completed,
    /// Cancelled while still pending
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Statuses in pipeline order, `Cancelled` last.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Position in the forward pipeline; `None` for `Cancelled`.
    #[must_use]
    pub const fn stage(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Completed => Some(4),
            Self::Cancelled => None,
        }
    }

    /// Whether an order in `self` may move to `next`.
    ///
    /// Forward moves along the pipeline are allowed (skipping stages too);
    /// `Cancelled` is only reachable from `Pending`.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        match (self.stage(), next.stage()) {
            (Some(from), Some(to)) => to > from,
            (Some(0), None) => true,
            _ => false,
        }
    }

    /// Whether the order counts towards revenue.
    #[must_use]
    pub const fn is_revenue(self) -> bool {
        matches!(self, Self::Delivered | Self::Completed)
    }

    /// Status glyph used in order lists.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Pending => "⏳",
            Self::Confirmed => "✅",
            Self::Shipped => "🚚",
            Self::Delivered => "📬",
            Self::Completed => "🏁",
            Self::Cancelled => "❌",
        }
    }

    /// Parses the name used in filter tokens (`Pending`, `Shipped`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.name() == name)
    }

    /// Stable name, identical to the stored value.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Client who placed the order
    pub user_id: i64,
    /// Current status
    pub status: OrderStatus,
    /// Sum of the snapshotted lines at checkout
    pub total_amount: Decimal,
    /// Address typed by the client at checkout
    #[sea_orm(column_type = "Text")]
    pub delivery_address: String,
    /// Photo sent by an admin on delivery
    pub delivery_photo: Option<String>,
    /// Comment attached to the delivery photo
    #[sea_orm(column_type = "Text", nullable)]
    pub delivery_comment: Option<String>,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the status or delivery data last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// One order has many lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        assert!(OrderStatus::Pending.can_become(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_become(OrderStatus::Shipped));
        assert!(OrderStatus::Pending.can_become(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_become(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivered.can_become(OrderStatus::Delivered));
        assert!(!OrderStatus::Cancelled.can_become(OrderStatus::Confirmed));
    }

    #[test]
    fn test_cancel_only_from_pending() {
        assert!(OrderStatus::Pending.can_become(OrderStatus::Cancelled));
        for status in &OrderStatus::ALL[1..] {
            assert!(!status.can_become(OrderStatus::Cancelled), "{status}");
        }
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_name(status.name()), Some(status));
        }
        assert_eq!(OrderStatus::from_name("pending"), None);
    }
}
