//! Token authentication extractor.
//!
//! Clients send `Authorization: Token <key>` (or `Bearer <key>`). The key is
//! hashed with SHA-256 and looked up in `loan.auth_token`; only active users
//! are accepted.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db;
use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::hash_token;
use crate::state::AppState;

const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
const INVALID_TOKEN: &str = "Invalid token.";

/// Extractor that requires a valid API token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Pull the key out of an `Authorization` header value.
///
/// Returns `None` for a missing scheme, an unknown scheme or an empty key.
fn parse_authorization(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    if !(scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer")) {
        return None;
    }
    let key = key.trim();
    (!key.is_empty() && !key.contains(' ')).then_some(key)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized(NOT_PROVIDED.to_owned()))?;

        let key = header
            .to_str()
            .ok()
            .and_then(parse_authorization)
            .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_owned()))?;

        let user_id = db::tokens::find_user_id(state.pool(), &hash_token(key))
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_owned()))?;

        let user = db::users::get_by_id(state.pool(), user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("User inactive or deleted.".to_owned()))?;

        set_sentry_user(user.id.as_i64(), user.email.as_str());
        tracing::Span::current().record("user_id", user.id.as_i64());

        Ok(Self(user))
    }
}
