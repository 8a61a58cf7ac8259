//! Authentication service.
//!
//! Password accounts with one opaque API token per user. Tokens are handed
//! to the client once; only their SHA-256 digest is stored.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{PgConnection, PgPool};

use estate_desk_core::{AuditAction, AuditEntity, Email, FieldErrors, TeamId, UserId};

use crate::db::{self, RepositoryError};
use crate::models::user::{
    AccountChanges, DEFAULT_TEAM, NewUser, TokenRequest, User, UserPayload,
};

/// Number of random bytes in an API token.
const TOKEN_BYTES: usize = 20;

/// Authentication service.
///
/// Handles registration, token login and account updates.
pub struct AuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a user from `POST /user/create/` and put them in the default team.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for invalid fields or a duplicate email.
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn register(&self, payload: UserPayload) -> Result<User, AuthError> {
        let changes = payload.validate(false)?;
        let (Some(email), Some(password)) = (changes.email, changes.password) else {
            return Err(FieldErrors::single("email", "This field is required.").into());
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let team = default_team(&mut tx).await?;
        let user = insert_user(
            &mut tx,
            NewUser {
                email,
                name: changes.name.unwrap_or_default(),
                password_hash: hash_password(&password)?,
                team_id: Some(team),
                is_staff: false,
                is_superuser: false,
            },
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Create a staff superuser account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for an invalid email, a short password
    /// or a duplicate email.
    pub async fn create_superuser(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let changes = UserPayload {
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
            name: Some(name.to_owned()),
        }
        .validate(false)?;
        let (Some(email), Some(password)) = (changes.email, changes.password) else {
            return Err(FieldErrors::single("email", "This field is required.").into());
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let user = insert_user(
            &mut tx,
            NewUser {
                email,
                name: changes.name.unwrap_or_default(),
                password_hash: hash_password(&password)?,
                team_id: None,
                is_staff: true,
                is_superuser: true,
            },
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(user_id = %user.id, "superuser created");
        Ok(user)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Check credentials and hand out a fresh token, replacing any old one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email, a wrong or
    /// empty password, or an inactive account.
    pub async fn login(&self, request: TokenRequest) -> Result<String, AuthError> {
        if request.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let email = Email::parse(&request.email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = db::users::get_password_hash(self.pool, &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&request.password, &password_hash)?;
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        db::tokens::replace(self.pool, user.id, &hash_token(&token)).await?;

        tracing::info!(user_id = %user.id, "token issued");
        Ok(token)
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Update the authenticated user's name, email or password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for invalid fields or a taken email.
    pub async fn update_account(
        &self,
        user: &User,
        payload: UserPayload,
        partial: bool,
    ) -> Result<User, AuthError> {
        let AccountChanges {
            email,
            password,
            name,
        } = payload.validate(partial)?;
        let password_hash = password.as_deref().map(hash_password).transpose()?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let updated = db::users::update(
            &mut *tx,
            user.id,
            email.as_ref(),
            name.as_deref(),
            password_hash.as_deref(),
        )
        .await
        .map_err(email_conflict)?;
        db::audit::record(
            &mut *tx,
            AuditEntity::User,
            updated.id.as_i64(),
            AuditAction::Update,
            Some(user.id),
            &updated,
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(updated)
    }

    /// Delete a user by email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user has this email.
    /// Returns `AuthError::Repository` with `Protected` if an application
    /// references the user.
    pub async fn delete_user(&self, email: &str) -> Result<UserId, AuthError> {
        let email = Email::parse(email)
            .map_err(|e| FieldErrors::single("email", e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let user = db::users::get_by_email(&mut *tx, &email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        db::users::delete(&mut *tx, user.id).await?;
        db::audit::record(
            &mut *tx,
            AuditEntity::User,
            user.id.as_i64(),
            AuditAction::Delete,
            None,
            &serde_json::json!({}),
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(user_id = %user.id, "user deleted");
        Ok(user.id)
    }
}

/// Get or create the team self-registered users join.
async fn default_team(conn: &mut PgConnection) -> Result<TeamId, RepositoryError> {
    if let Some(team) = db::teams::find_by_name(&mut *conn, DEFAULT_TEAM).await? {
        return Ok(team.id);
    }
    let team = db::teams::create(&mut *conn, DEFAULT_TEAM).await?;
    db::audit::record(
        &mut *conn,
        AuditEntity::Team,
        team.id.as_i64(),
        AuditAction::Create,
        None,
        &team,
    )
    .await?;
    Ok(team.id)
}

async fn insert_user(conn: &mut PgConnection, new_user: NewUser) -> Result<User, AuthError> {
    let user = db::users::create(&mut *conn, &new_user)
        .await
        .map_err(email_conflict)?;
    db::audit::record(
        &mut *conn,
        AuditEntity::User,
        user.id.as_i64(),
        AuditAction::Create,
        None,
        &user,
    )
    .await?;
    Ok(user)
}

/// Report a duplicate email against the `email` field.
fn email_conflict(err: RepositoryError) -> AuthError {
    match err {
        RepositoryError::Conflict(message) => FieldErrors::single("email", message).into(),
        other => other.into(),
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a new API token: random bytes, hex-encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest under which a token is stored and looked up.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
