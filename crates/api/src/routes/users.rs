//! Account registration, token login and the current user.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use crate::{
    db,
    error::AppError,
    extract::Payload,
    middleware::RequireAuth,
    models::user::{TokenRequest, TokenResponse, UserPayload},
    models::{User, UserSummary},
    services::AuthService,
    state::AppState,
};

/// Build the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create))
        .route("/user/token", post(token))
        .route("/user/me", get(me).put(replace_me).patch(patch_me))
        .route("/user/list", get(list))
}

/// Register a new account.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Payload(payload): Payload<UserPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AuthService::new(state.pool()).register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange email and password for an API token.
#[instrument(skip_all)]
pub async fn token(
    State(state): State<AppState>,
    Payload(request): Payload<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = AuthService::new(state.pool()).login(request).await?;
    Ok(Json(TokenResponse { token }))
}

/// The authenticated user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<User> {
    Json(user)
}

/// Replace the authenticated user's account fields.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn replace_me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Payload(payload): Payload<UserPayload>,
) -> Result<Json<User>, AppError> {
    let user = AuthService::new(state.pool())
        .update_account(&user, payload, false)
        .await?;
    Ok(Json(user))
}

/// Update some of the authenticated user's account fields.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn patch_me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Payload(payload): Payload<UserPayload>,
) -> Result<Json<User>, AppError> {
    let user = AuthService::new(state.pool())
        .update_account(&user, payload, true)
        .await?;
    Ok(Json(user))
}

/// List every user.
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = db::users::list_all(state.pool()).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}
