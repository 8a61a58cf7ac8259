//! Business logic services.
//!
//! Services own transactions: each write opens one with `pool.begin()`,
//! passes `&mut *tx` to the repository functions and commits at the end.
//! Returning early drops the transaction, which rolls it back.
//!
//! # Services
//!
//! - `auth` - Registration, token login, account updates, password hashing
//! - `applications` - Nested application create/update with relation resolution
//! - `directory` - Agency and solicitor CRUD
//! - `estates` - Nested estate composition and child management

pub mod applications;
pub mod auth;
pub mod directory;
pub mod estates;

pub use applications::ApplicationService;
pub use auth::{AuthError, AuthService};
pub use directory::DirectoryService;
pub use estates::EstateService;

use thiserror::Error;

use estate_desk_core::FieldErrors;

use crate::db::RepositoryError;

/// Errors raised by the CRUD services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected; reported per field.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Target row does not exist.
    #[error("not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
