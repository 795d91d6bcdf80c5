//! Support message entity - One message in an order's support thread.
//!
//! A thread is identified by `(order_id, client_id)`. `order_id` 0 holds general
//! questions, so the column carries no foreign key, and `client_id` keeps one
//! client's general questions apart from another's. Each side has its own read
//! flag; a new message starts read for its author's side and unread for the
//! other.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who wrote a support message
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SenderKind {
    /// The client who owns the thread
    #[sea_orm(string_value = "Client")]
    Client,
    /// Any admin
    #[sea_orm(string_value = "Admin")]
    Admin,
}

/// Thread id used for questions not tied to an order.
pub const GENERAL_THREAD: i64 = 0;

/// Support message database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "support_messages")]
pub struct Model {
    /// Unique identifier for the message
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order the thread is about, or [`GENERAL_THREAD`]
    pub order_id: i64,
    /// Client the thread is with
    pub client_id: i64,
    /// Platform id of the author
    pub sender_id: i64,
    /// Whether the author is the client or an admin
    pub sender_kind: SenderKind,
    /// Message text
    #[sea_orm(column_type = "Text", nullable)]
    pub text: Option<String>,
    /// Photo reference
    pub photo: Option<String>,
    /// When the message was sent
    pub sent_at: DateTimeUtc,
    /// Seen by an admin
    pub is_read_by_admin: bool,
    /// Seen by the client
    pub is_read_by_client: bool,
}

/// Support messages reference orders without owning them
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
