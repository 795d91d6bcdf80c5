//! User entity - One row per chat-platform account that has ever talked to the bot.
//!
//! The primary key is the platform user id, so rows are created on the first
//! inbound event and never deleted. `state` holds the user's position in the
//! conversation state machine.

use crate::core::state::ConversationState;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Platform user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Platform handle, if the user has one
    pub username: Option<String>,
    /// Name shown in admin views and notifications
    pub display_name: String,
    /// City the catalog is scoped to; `None` until the user picks one
    pub city: Option<String>,
    /// Current conversation state
    pub state: ConversationState,
    /// Mirror of the admin allowlist at the user's last event. Display only.
    pub is_admin: bool,
    /// When the user first contacted the bot
    pub created_at: DateTimeUtc,
    /// When the user last sent anything
    pub last_activity: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many cart items
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
