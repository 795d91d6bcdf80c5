//! Audit entry entity - Durable trail of admin actions and refused access.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Platform id of the user who acted
    pub actor_id: i64,
    /// `"security"` for refused access, `"admin"` for admin mutations
    pub kind: String,
    /// Token or flow that was attempted (e.g. `"admin_ship_12"`)
    pub action: String,
    /// Free-form context
    #[sea_orm(column_type = "Text")]
    pub detail: String,
    /// When it happened
    pub created_at: DateTimeUtc,
}

/// `AuditEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
