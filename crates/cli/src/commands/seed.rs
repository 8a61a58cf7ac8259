//! Seed lookup tables.

use estate_desk_api::db::application_statuses;
use estate_desk_core::{ApplicationStatusId, KnownStatus};

use super::{CliError, connect};

/// Upsert the fixed application status table.
///
/// Existing rows with a seeded id are renamed to the canonical label;
/// statuses created through the API with other ids are left alone.
///
/// # Errors
///
/// Returns an error if the connection or any upsert fails.
pub async fn statuses() -> Result<(), CliError> {
    let pool = connect().await?;

    let mut tx = pool.begin().await?;
    for status in KnownStatus::ALL {
        let row = application_statuses::put_with_id(
            &mut tx,
            ApplicationStatusId::new(status.id()),
            status.label(),
            true,
        )
        .await?;
        tracing::info!(id = %row.id, name = %row.name, "status seeded");
    }
    tx.commit().await?;

    tracing::info!(count = KnownStatus::ALL.len(), "Application statuses seeded");
    Ok(())
}
