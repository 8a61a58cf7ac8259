//! Team repository.

use sqlx::PgExecutor;

use estate_desk_core::TeamId;

use super::RepositoryError;
use crate::models::user::Team;

#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: i64,
    name: String,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Self {
            id: TeamId::new(row.id),
            name: row.name,
        }
    }
}

/// Find the first team with the given name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_name(
    executor: impl PgExecutor<'_>,
    name: &str,
) -> Result<Option<Team>, RepositoryError> {
    let row = sqlx::query_as::<_, TeamRow>(
        "SELECT id, name FROM loan.team WHERE name = $1 ORDER BY id LIMIT 1",
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Create a team.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(executor: impl PgExecutor<'_>, name: &str) -> Result<Team, RepositoryError> {
    let row = sqlx::query_as::<_, TeamRow>(
        "INSERT INTO loan.team (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}
