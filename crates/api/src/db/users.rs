//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use estate_desk_core::{Email, TeamId, UserId};

use super::{RepositoryError, protected_delete, unique_violation};
use crate::models::user::{NewUser, User};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    team_id: Option<i64>,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            team_id: row.team_id.map(TeamId::new),
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const DUPLICATE_EMAIL: &str = "user with this email already exists.";

// =============================================================================
// Queries
// =============================================================================

/// List every user, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_all(executor: impl PgExecutor<'_>) -> Result<Vec<User>, RepositoryError> {
    let rows = sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, email, name, team_id, is_active, is_staff, is_superuser, created_at
        FROM loan.app_user
        ORDER BY id
        ",
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Get a user by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    executor: impl PgExecutor<'_>,
    id: UserId,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, email, name, team_id, is_active, is_staff, is_superuser, created_at
        FROM loan.app_user
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Get a user by email address.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_email(
    executor: impl PgExecutor<'_>,
    email: &Email,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, email, name, team_id, is_active, is_staff, is_superuser, created_at
        FROM loan.app_user
        WHERE email = $1
        ",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Get a user together with their password hash.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_password_hash(
    executor: impl PgExecutor<'_>,
    email: &Email,
) -> Result<Option<(User, String)>, RepositoryError> {
    let row = sqlx::query_as::<_, UserWithHashRow>(
        r"
        SELECT id, email, name, team_id, is_active, is_staff, is_superuser, created_at,
               password_hash
        FROM loan.app_user
        WHERE email = $1
        ",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    match row {
        Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
        None => Ok(None),
    }
}

/// Create a user.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email already exists.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn create(
    executor: impl PgExecutor<'_>,
    new_user: &NewUser,
) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        INSERT INTO loan.app_user (email, name, password_hash, team_id, is_staff, is_superuser)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, email, name, team_id, is_active, is_staff, is_superuser, created_at
        ",
    )
    .bind(&new_user.email)
    .bind(&new_user.name)
    .bind(&new_user.password_hash)
    .bind(new_user.team_id)
    .bind(new_user.is_staff)
    .bind(new_user.is_superuser)
    .fetch_one(executor)
    .await
    .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))?;

    row.try_into()
}

/// Update the supplied account fields of a user.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
/// Returns `RepositoryError::Conflict` if the new email is taken.
pub async fn update(
    executor: impl PgExecutor<'_>,
    id: UserId,
    email: Option<&Email>,
    name: Option<&str>,
    password_hash: Option<&str>,
) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        UPDATE loan.app_user
        SET email = COALESCE($2, email),
            name = COALESCE($3, name),
            password_hash = COALESCE($4, password_hash)
        WHERE id = $1
        RETURNING id, email, name, team_id, is_active, is_staff, is_superuser, created_at
        ",
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_optional(executor)
    .await
    .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}

/// Delete a user.
///
/// # Errors
///
/// Returns `RepositoryError::Protected` if an application references the user.
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn delete(executor: impl PgExecutor<'_>, id: UserId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.app_user WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| protected_delete(e, "user"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
