//! Audit log repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;

use estate_desk_core::{AuditAction, AuditEntity, AuditEntryId, UserId};

use super::RepositoryError;
use crate::models::AuditEntry;

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: i64,
    entity: AuditEntity,
    entity_id: i64,
    action: AuditAction,
    actor_id: Option<i64>,
    changes: serde_json::Value,
    recorded_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            id: AuditEntryId::new(row.id),
            entity: row.entity,
            entity_id: row.entity_id,
            action: row.action,
            actor_id: row.actor_id.map(UserId::new),
            changes: row.changes,
            recorded_at: row.recorded_at,
        }
    }
}

/// Record a change. `changes` is stored as a JSON snapshot.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if `changes` cannot be serialized.
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn record(
    executor: impl PgExecutor<'_>,
    entity: AuditEntity,
    entity_id: i64,
    action: AuditAction,
    actor: Option<UserId>,
    changes: &impl Serialize,
) -> Result<(), RepositoryError> {
    let changes = serde_json::to_value(changes).map_err(|e| {
        RepositoryError::DataCorruption(format!("unserializable audit snapshot: {e}"))
    })?;

    sqlx::query(
        r"
        INSERT INTO loan.audit_log (entity, entity_id, action, actor_id, changes)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(entity)
    .bind(entity_id)
    .bind(action)
    .bind(actor)
    .bind(changes)
    .execute(executor)
    .await?;

    Ok(())
}

/// History of one entity, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn history(
    executor: impl PgExecutor<'_>,
    entity: AuditEntity,
    entity_id: i64,
) -> Result<Vec<AuditEntry>, RepositoryError> {
    let rows = sqlx::query_as::<_, AuditRow>(
        r"
        SELECT id, entity, entity_id, action, actor_id, changes, recorded_at
        FROM loan.audit_log
        WHERE entity = $1 AND entity_id = $2
        ORDER BY recorded_at DESC, id DESC
        ",
    )
    .bind(entity)
    .bind(entity_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
