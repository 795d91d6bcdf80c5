//! Audit trail for admin actions and refused access.
//!
//! Every entry is written to the `audit_log` table and mirrored on the `audit`
//! tracing target, so it survives restarts and still shows up in the logs.

use crate::{
    entities::{AuditEntry, audit_entry},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Kind recorded for refused admin access.
pub const SECURITY: &str = "security";
/// Kind recorded for successful admin mutations.
pub const ADMIN: &str = "admin";

async fn record(
    db: &DatabaseConnection,
    actor_id: i64,
    kind: &str,
    action: &str,
    detail: &str,
) -> Result<audit_entry::Model> {
    audit_entry::ActiveModel {
        actor_id: Set(actor_id),
        kind: Set(kind.to_string()),
        action: Set(action.to_string()),
        detail: Set(detail.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Records a non-admin attempting an admin action.
pub async fn record_violation(
    db: &DatabaseConnection,
    actor_id: i64,
    action: &str,
    detail: &str,
) -> Result<audit_entry::Model> {
    tracing::warn!(target: "audit", actor_id, action, detail, "Security violation");
    record(db, actor_id, SECURITY, action, detail).await
}

/// Records an admin mutation.
pub async fn record_admin_action(
    db: &DatabaseConnection,
    actor_id: i64,
    action: &str,
    detail: &str,
) -> Result<audit_entry::Model> {
    tracing::info!(target: "audit", actor_id, action, detail, "Admin action");
    record(db, actor_id, ADMIN, action, detail).await
}

/// Latest entries, newest first.
pub async fn recent_entries(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<audit_entry::Model>> {
    AuditEntry::find()
        .order_by_desc(audit_entry::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}
