//! Agency repository.

use sqlx::PgExecutor;

use estate_desk_core::AgencyId;

use super::{RepositoryError, protected_delete};
use crate::models::agency::{Agency, AgencyFields};

#[derive(Debug, sqlx::FromRow)]
struct AgencyRow {
    id: i64,
    name: String,
    house_number: String,
    street: String,
    town: String,
    county: String,
    eircode: String,
}

impl From<AgencyRow> for Agency {
    fn from(row: AgencyRow) -> Self {
        Self {
            id: AgencyId::new(row.id),
            name: row.name,
            house_number: row.house_number,
            street: row.street,
            town: row.town,
            county: row.county,
            eircode: row.eircode,
        }
    }
}

/// List agencies ordered by name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_all(executor: impl PgExecutor<'_>) -> Result<Vec<Agency>, RepositoryError> {
    let rows = sqlx::query_as::<_, AgencyRow>(
        r"
        SELECT id, name, house_number, street, town, county, eircode
        FROM loan.agency
        ORDER BY name, id
        ",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Get an agency by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    executor: impl PgExecutor<'_>,
    id: AgencyId,
) -> Result<Option<Agency>, RepositoryError> {
    let row = sqlx::query_as::<_, AgencyRow>(
        r"
        SELECT id, name, house_number, street, town, county, eircode
        FROM loan.agency
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Find the oldest agency with the given name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_name(
    executor: impl PgExecutor<'_>,
    name: &str,
) -> Result<Option<Agency>, RepositoryError> {
    let row = sqlx::query_as::<_, AgencyRow>(
        r"
        SELECT id, name, house_number, street, town, county, eircode
        FROM loan.agency
        WHERE name = $1
        ORDER BY id
        LIMIT 1
        ",
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Create an agency. Missing fields are stored as empty strings.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(
    executor: impl PgExecutor<'_>,
    fields: &AgencyFields,
) -> Result<Agency, RepositoryError> {
    let row = sqlx::query_as::<_, AgencyRow>(
        r"
        INSERT INTO loan.agency (name, house_number, street, town, county, eircode)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, house_number, street, town, county, eircode
        ",
    )
    .bind(fields.name.as_deref().unwrap_or_default())
    .bind(fields.house_number.as_deref().unwrap_or_default())
    .bind(fields.street.as_deref().unwrap_or_default())
    .bind(fields.town.as_deref().unwrap_or_default())
    .bind(fields.county.as_deref().unwrap_or_default())
    .bind(fields.eircode.as_deref().unwrap_or_default())
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Update the supplied fields of an agency.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the agency does not exist.
pub async fn update(
    executor: impl PgExecutor<'_>,
    id: AgencyId,
    fields: &AgencyFields,
) -> Result<Agency, RepositoryError> {
    let row = sqlx::query_as::<_, AgencyRow>(
        r"
        UPDATE loan.agency
        SET name = COALESCE($2, name),
            house_number = COALESCE($3, house_number),
            street = COALESCE($4, street),
            town = COALESCE($5, town),
            county = COALESCE($6, county),
            eircode = COALESCE($7, eircode)
        WHERE id = $1
        RETURNING id, name, house_number, street, town, county, eircode
        ",
    )
    .bind(id)
    .bind(fields.name.as_deref())
    .bind(fields.house_number.as_deref())
    .bind(fields.street.as_deref())
    .bind(fields.town.as_deref())
    .bind(fields.county.as_deref())
    .bind(fields.eircode.as_deref())
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Delete an agency. Its solicitors are kept with no agency.
///
/// # Errors
///
/// Returns `RepositoryError::Protected` if an application references the agency.
/// Returns `RepositoryError::NotFound` if the agency does not exist.
pub async fn delete(executor: impl PgExecutor<'_>, id: AgencyId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.agency WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| protected_delete(e, "agency"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
