//! Application status lookup table.

use sqlx::{PgConnection, PgExecutor};

use estate_desk_core::ApplicationStatusId;

use super::RepositoryError;
use crate::models::ApplicationStatus;

#[derive(Debug, sqlx::FromRow)]
struct StatusRow {
    id: i64,
    name: String,
}

impl From<StatusRow> for ApplicationStatus {
    fn from(row: StatusRow) -> Self {
        Self {
            id: ApplicationStatusId::new(row.id),
            name: row.name,
        }
    }
}

/// List every status in id order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_all(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<ApplicationStatus>, RepositoryError> {
    let rows = sqlx::query_as::<_, StatusRow>(
        "SELECT id, name FROM loan.application_status ORDER BY id",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Get a status by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    executor: impl PgExecutor<'_>,
    id: ApplicationStatusId,
) -> Result<Option<ApplicationStatus>, RepositoryError> {
    let row = sqlx::query_as::<_, StatusRow>(
        "SELECT id, name FROM loan.application_status WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Find the lowest-id status with the given name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_name(
    executor: impl PgExecutor<'_>,
    name: &str,
) -> Result<Option<ApplicationStatus>, RepositoryError> {
    let row = sqlx::query_as::<_, StatusRow>(
        "SELECT id, name FROM loan.application_status WHERE name = $1 ORDER BY id LIMIT 1",
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Create a status with a generated id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(
    executor: impl PgExecutor<'_>,
    name: &str,
) -> Result<ApplicationStatus, RepositoryError> {
    let row = sqlx::query_as::<_, StatusRow>(
        "INSERT INTO loan.application_status (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Insert a status with an explicit id, or rename the existing row when
/// `overwrite` is set. The identity sequence is moved past the id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn put_with_id(
    conn: &mut PgConnection,
    id: ApplicationStatusId,
    name: &str,
    overwrite: bool,
) -> Result<ApplicationStatus, RepositoryError> {
    let row = sqlx::query_as::<_, StatusRow>(
        r"
        INSERT INTO loan.application_status (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE
            SET name = CASE WHEN $3 THEN EXCLUDED.name ELSE loan.application_status.name END
        RETURNING id, name
        ",
    )
    .bind(id)
    .bind(name)
    .bind(overwrite)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r"
        SELECT setval(
            pg_get_serial_sequence('loan.application_status', 'id'),
            GREATEST((SELECT MAX(id) FROM loan.application_status), 0)
        )
        ",
    )
    .execute(&mut *conn)
    .await?;

    Ok(row.into())
}
