//! API token repository.
//!
//! Only the SHA-256 digest of a token is stored; the clear key is handed to
//! the client once.

use sqlx::PgExecutor;

use estate_desk_core::UserId;

use super::RepositoryError;

/// Store a token digest for a user, replacing any previous token.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn replace(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
    key_hash: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO loan.auth_token (key_hash, user_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET key_hash = EXCLUDED.key_hash, created_at = NOW()
        ",
    )
    .bind(key_hash)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Resolve a token digest to the owning user id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_user_id(
    executor: impl PgExecutor<'_>,
    key_hash: &str,
) -> Result<Option<UserId>, RepositoryError> {
    let user_id = sqlx::query_scalar::<_, i64>(
        "SELECT user_id FROM loan.auth_token WHERE key_hash = $1",
    )
    .bind(key_hash)
    .fetch_optional(executor)
    .await?;

    Ok(user_id.map(UserId::new))
}
