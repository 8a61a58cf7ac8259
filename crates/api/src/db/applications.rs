//! Loan application repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;

use estate_desk_core::{
    AgencyId, ApplicationId, ApplicationStatusId, LoanAmount, LoanTerm, SolicitorId, UserId,
};

use super::RepositoryError;
use crate::models::Application;
use crate::models::application::ApplicationRecord;

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    amount: Decimal,
    term: i32,
    user_id: Option<i64>,
    application_status_id: Option<i64>,
    agency_id: Option<i64>,
    created_by_id: Option<i64>,
    lead_solicitor_id: Option<i64>,
    date_submitted: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = RepositoryError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let amount = LoanAmount::new(row.amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid amount in database: {e}"))
        })?;
        let term = LoanTerm::new(row.term).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid term in database: {e}"))
        })?;

        Ok(Self {
            id: ApplicationId::new(row.id),
            amount,
            term,
            user_id: row.user_id.map(UserId::new),
            application_status_id: row.application_status_id.map(ApplicationStatusId::new),
            agency_id: row.agency_id.map(AgencyId::new),
            created_by_id: row.created_by_id.map(UserId::new),
            lead_solicitor_id: row.lead_solicitor_id.map(SolicitorId::new),
            date_submitted: row.date_submitted,
        })
    }
}

/// List applications, newest first, optionally for one agency.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(
    executor: impl PgExecutor<'_>,
    agency: Option<AgencyId>,
) -> Result<Vec<Application>, RepositoryError> {
    let rows = sqlx::query_as::<_, ApplicationRow>(
        r"
        SELECT id, amount, term, user_id, application_status_id, agency_id,
               created_by_id, lead_solicitor_id, date_submitted
        FROM loan.application
        WHERE $1::BIGINT IS NULL OR agency_id = $1
        ORDER BY id DESC
        ",
    )
    .bind(agency)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Get an application by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    executor: impl PgExecutor<'_>,
    id: ApplicationId,
) -> Result<Option<Application>, RepositoryError> {
    let row = sqlx::query_as::<_, ApplicationRow>(
        r"
        SELECT id, amount, term, user_id, application_status_id, agency_id,
               created_by_id, lead_solicitor_id, date_submitted
        FROM loan.application
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Insert an application.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    executor: impl PgExecutor<'_>,
    record: &ApplicationRecord,
) -> Result<Application, RepositoryError> {
    let row = sqlx::query_as::<_, ApplicationRow>(
        r"
        INSERT INTO loan.application (
            amount, term, user_id, application_status_id, agency_id,
            created_by_id, lead_solicitor_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, amount, term, user_id, application_status_id, agency_id,
                  created_by_id, lead_solicitor_id, date_submitted
        ",
    )
    .bind(record.amount)
    .bind(record.term)
    .bind(record.user_id)
    .bind(record.application_status_id)
    .bind(record.agency_id)
    .bind(record.created_by_id)
    .bind(record.lead_solicitor_id)
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Overwrite every writable column of an application.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the application does not exist.
pub async fn update(
    executor: impl PgExecutor<'_>,
    id: ApplicationId,
    record: &ApplicationRecord,
) -> Result<Application, RepositoryError> {
    let row = sqlx::query_as::<_, ApplicationRow>(
        r"
        UPDATE loan.application
        SET amount = $2,
            term = $3,
            user_id = $4,
            application_status_id = $5,
            agency_id = $6,
            created_by_id = $7,
            lead_solicitor_id = $8
        WHERE id = $1
        RETURNING id, amount, term, user_id, application_status_id, agency_id,
                  created_by_id, lead_solicitor_id, date_submitted
        ",
    )
    .bind(id)
    .bind(record.amount)
    .bind(record.term)
    .bind(record.user_id)
    .bind(record.application_status_id)
    .bind(record.agency_id)
    .bind(record.created_by_id)
    .bind(record.lead_solicitor_id)
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}

/// Delete an application. Its estates are removed with it.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the application does not exist.
pub async fn delete(
    executor: impl PgExecutor<'_>,
    id: ApplicationId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.application WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
