//! Unified error handling for the HTTP boundary.
//!
//! Every handler returns `Result<_, AppError>`. Client errors render as JSON
//! bodies in one of two shapes:
//!
//! - field errors: `{"amount": ["..."], "agency.name": ["..."]}`
//! - everything else: `{"detail": "..."}`
//!
//! Server errors are reported to Sentry and logged; the client only sees a
//! generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use estate_desk_core::FieldErrors;

use crate::db::RepositoryError;
use crate::services::{AuthError, ServiceError};

/// Message returned when login fails.
pub const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Login with a wrong email/password pair.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or unknown token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => Self::Validation(errors),
            ServiceError::NotFound => Self::NotFound,
            ServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::UserNotFound => Self::NotFound,
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_owned()),
            AuthError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCredentials | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound | Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::BAD_REQUEST,
            Self::Database(RepositoryError::Protected(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(errors) => json!(errors),
            Self::InvalidCredentials => json!({ "non_field_errors": [INVALID_CREDENTIALS] }),
            Self::Unauthorized(message) | Self::BadRequest(message) => json!({ "detail": message }),
            Self::NotFound | Self::Database(RepositoryError::NotFound) => {
                json!({ "detail": "Not found." })
            }
            Self::Database(
                RepositoryError::Conflict(message) | RepositoryError::Protected(message),
            ) => json!({ "detail": message }),
            Self::Database(_) | Self::Internal(_) => json!({ "detail": "Internal server error" }),
        };

        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context for the authenticated user.
pub fn set_sentry_user(user_id: i64, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
        assert_eq!(AppError::NotFound.to_string(), "Not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::InvalidCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Protected("x".to_string()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("x".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_is_field_map() {
        let mut errors = FieldErrors::new();
        errors.add("term", "Ensure this value is less than or equal to 36.");
        let (status, body) = render(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"term": ["Ensure this value is less than or equal to 36."]})
        );
    }

    #[tokio::test]
    async fn test_invalid_credentials_body() {
        let (_, body) = render(AppError::InvalidCredentials).await;
        assert_eq!(body, json!({"non_field_errors": [INVALID_CREDENTIALS]}));
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = render(AppError::Internal("secret stack".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "Internal server error"}));
    }

    #[test]
    fn test_service_error_folds_into_app_error() {
        let err: AppError = ServiceError::NotFound.into();
        assert!(matches!(err, AppError::NotFound));

        let err: AppError = ServiceError::Validation(FieldErrors::single("name", "bad")).into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
