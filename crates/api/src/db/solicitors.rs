//! Solicitor repository.

use sqlx::PgExecutor;

use estate_desk_core::{AgencyId, SolicitorId};

use super::{RepositoryError, protected_delete};
use crate::models::agency::{Solicitor, SolicitorFields};

#[derive(Debug, sqlx::FromRow)]
struct SolicitorRow {
    id: i64,
    title: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: String,
    agency_id: Option<i64>,
}

impl From<SolicitorRow> for Solicitor {
    fn from(row: SolicitorRow) -> Self {
        Self {
            id: SolicitorId::new(row.id),
            title: row.title,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone_number: row.phone_number,
            agency_id: row.agency_id.map(AgencyId::new),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SolicitorWithAgencyRow {
    #[sqlx(flatten)]
    solicitor: SolicitorRow,
    agency_name: Option<String>,
}

/// List solicitors ordered by last name, each with its agency name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_with_agency(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<(Solicitor, Option<String>)>, RepositoryError> {
    let rows = sqlx::query_as::<_, SolicitorWithAgencyRow>(
        r"
        SELECT s.id, s.title, s.first_name, s.last_name, s.email, s.phone_number, s.agency_id,
               a.name AS agency_name
        FROM loan.solicitor s
        LEFT JOIN loan.agency a ON a.id = s.agency_id
        ORDER BY s.last_name, s.first_name, s.id
        ",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.solicitor.into(), row.agency_name))
        .collect())
}

/// Get a solicitor with its agency name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_with_agency(
    executor: impl PgExecutor<'_>,
    id: SolicitorId,
) -> Result<Option<(Solicitor, Option<String>)>, RepositoryError> {
    let row = sqlx::query_as::<_, SolicitorWithAgencyRow>(
        r"
        SELECT s.id, s.title, s.first_name, s.last_name, s.email, s.phone_number, s.agency_id,
               a.name AS agency_name
        FROM loan.solicitor s
        LEFT JOIN loan.agency a ON a.id = s.agency_id
        WHERE s.id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|row| (row.solicitor.into(), row.agency_name)))
}

/// List the solicitors of the given agencies, ordered by last name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_agencies(
    executor: impl PgExecutor<'_>,
    agency_ids: &[AgencyId],
) -> Result<Vec<Solicitor>, RepositoryError> {
    let rows = sqlx::query_as::<_, SolicitorRow>(
        r"
        SELECT id, title, first_name, last_name, email, phone_number, agency_id
        FROM loan.solicitor
        WHERE agency_id = ANY($1)
        ORDER BY last_name, first_name, id
        ",
    )
    .bind(agency_ids)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Get a solicitor by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    executor: impl PgExecutor<'_>,
    id: SolicitorId,
) -> Result<Option<Solicitor>, RepositoryError> {
    let row = sqlx::query_as::<_, SolicitorRow>(
        r"
        SELECT id, title, first_name, last_name, email, phone_number, agency_id
        FROM loan.solicitor
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Find the oldest solicitor with the given first and last name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_name(
    executor: impl PgExecutor<'_>,
    first_name: &str,
    last_name: &str,
) -> Result<Option<Solicitor>, RepositoryError> {
    let row = sqlx::query_as::<_, SolicitorRow>(
        r"
        SELECT id, title, first_name, last_name, email, phone_number, agency_id
        FROM loan.solicitor
        WHERE first_name = $1 AND last_name = $2
        ORDER BY id
        LIMIT 1
        ",
    )
    .bind(first_name)
    .bind(last_name)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Create a solicitor. Missing text fields are stored as empty strings.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(
    executor: impl PgExecutor<'_>,
    fields: &SolicitorFields,
) -> Result<Solicitor, RepositoryError> {
    let row = sqlx::query_as::<_, SolicitorRow>(
        r"
        INSERT INTO loan.solicitor (title, first_name, last_name, email, phone_number, agency_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, first_name, last_name, email, phone_number, agency_id
        ",
    )
    .bind(fields.title.as_deref().unwrap_or_default())
    .bind(fields.first_name.as_deref().unwrap_or_default())
    .bind(fields.last_name.as_deref().unwrap_or_default())
    .bind(fields.email.as_deref().unwrap_or_default())
    .bind(fields.phone_number.as_deref().unwrap_or_default())
    .bind(fields.agency.flatten())
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Update the supplied fields of a solicitor.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the solicitor does not exist.
pub async fn update(
    executor: impl PgExecutor<'_>,
    id: SolicitorId,
    fields: &SolicitorFields,
) -> Result<Solicitor, RepositoryError> {
    let row = sqlx::query_as::<_, SolicitorRow>(
        r"
        UPDATE loan.solicitor
        SET title = COALESCE($2, title),
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            email = COALESCE($5, email),
            phone_number = COALESCE($6, phone_number),
            agency_id = CASE WHEN $7 THEN $8 ELSE agency_id END
        WHERE id = $1
        RETURNING id, title, first_name, last_name, email, phone_number, agency_id
        ",
    )
    .bind(id)
    .bind(fields.title.as_deref())
    .bind(fields.first_name.as_deref())
    .bind(fields.last_name.as_deref())
    .bind(fields.email.as_deref())
    .bind(fields.phone_number.as_deref())
    .bind(fields.agency.is_some())
    .bind(fields.agency.flatten())
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Link a solicitor to an agency unless it already has one.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn link_agency_if_unset(
    executor: impl PgExecutor<'_>,
    id: SolicitorId,
    agency_id: AgencyId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE loan.solicitor SET agency_id = $2 WHERE id = $1 AND agency_id IS NULL",
    )
    .bind(id)
    .bind(agency_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a solicitor.
///
/// # Errors
///
/// Returns `RepositoryError::Protected` if an application references the solicitor.
/// Returns `RepositoryError::NotFound` if the solicitor does not exist.
pub async fn delete(executor: impl PgExecutor<'_>, id: SolicitorId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.solicitor WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| protected_delete(e, "solicitor"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
