//! Audit log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use estate_desk_core::{AuditAction, AuditEntity, AuditEntryId, UserId};

/// One recorded change.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub entity: AuditEntity,
    pub entity_id: i64,
    pub action: AuditAction,
    pub actor_id: Option<UserId>,
    pub changes: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}
