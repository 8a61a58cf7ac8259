//! Audit log inspection.

use sqlx::PgPool;

use estate_desk_api::db;
use estate_desk_core::{AgencyId, AuditEntity, SolicitorId};

use super::{CliError, connect};

/// Print the change history of one entity, newest first, one JSON object per line.
pub async fn show(entity: AuditEntity, id: i64) -> Result<(), CliError> {
    let pool = connect().await?;

    let entries = db::audit::history(&pool, entity, id).await?;
    if entries.is_empty() {
        tracing::warn!("No audit entries for {} {}", entity, id);
        return Ok(());
    }

    let label = current_label(&pool, entity, id).await?;
    let title = heading(entity, id, label.as_deref());
    tracing::info!(entries = entries.len(), "History of {title}");

    for entry in &entries {
        let line = serde_json::to_string(entry)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{line}");
        }
    }
    Ok(())
}

/// Human-readable name of the row as it stands now, if it still exists.
async fn current_label(
    pool: &PgPool,
    entity: AuditEntity,
    id: i64,
) -> Result<Option<String>, CliError> {
    let label = match entity {
        AuditEntity::Agency => db::agencies::get_by_id(pool, AgencyId::new(id))
            .await?
            .map(|agency| agency.name),
        AuditEntity::Solicitor => db::solicitors::get_by_id(pool, SolicitorId::new(id))
            .await?
            .map(|solicitor| solicitor.display_name()),
        AuditEntity::User | AuditEntity::Team | AuditEntity::Application => None,
    };
    Ok(label)
}

fn heading(entity: AuditEntity, id: i64, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!("{entity} {id} ({label})"),
        _ => format!("{entity} {id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_names_existing_rows() {
        assert_eq!(
            heading(AuditEntity::Solicitor, 3, Some("Ms Ann Lee")),
            "solicitor 3 (Ms Ann Lee)"
        );
        assert_eq!(heading(AuditEntity::Agency, 8, None), "agency 8");
        assert_eq!(heading(AuditEntity::Agency, 8, Some("")), "agency 8");
    }
}
