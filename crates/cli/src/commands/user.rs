//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a staff superuser
//! ed-cli user create-superuser -e admin@example.com -n "Admin Name" -p 'long password'
//!
//! # Delete an account
//! ed-cli user delete -e former@example.com
//! ```

use estate_desk_api::services::AuthService;
use estate_desk_core::UserId;

use super::{CliError, connect};

/// Create a staff superuser.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_superuser(email: &str, name: &str, password: &str) -> Result<UserId, CliError> {
    let pool = connect().await?;

    tracing::info!("Creating superuser: {}", email);
    let user = AuthService::new(&pool)
        .create_superuser(email, name, password)
        .await?;

    tracing::info!(
        "Superuser created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Delete a user by email.
///
/// Fails while applications still reference the user.
pub async fn delete(email: &str) -> Result<(), CliError> {
    let pool = connect().await?;

    let id = AuthService::new(&pool).delete_user(email).await?;

    tracing::info!("User deleted. ID: {}, Email: {}", id, email);
    Ok(())
}
