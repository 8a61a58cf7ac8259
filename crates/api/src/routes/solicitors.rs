//! Solicitor handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use estate_desk_core::SolicitorId;

use crate::{
    error::AppError,
    extract::{PathId, Payload},
    middleware::RequireAuth,
    models::SolicitorView,
    models::agency::SolicitorPayload,
    services::DirectoryService,
    state::AppState,
};

/// Build the solicitor router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/solicitors", get(list).post(create))
        .route(
            "/solicitors/{id}",
            get(show).put(replace).patch(patch).delete(destroy),
        )
}

pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<SolicitorView>>, AppError> {
    Ok(Json(DirectoryService::new(state.pool()).list_solicitors().await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Payload(payload): Payload<SolicitorPayload>,
) -> Result<(StatusCode, Json<SolicitorView>), AppError> {
    let solicitor = DirectoryService::new(state.pool())
        .create_solicitor(user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(solicitor)))
}

pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<SolicitorView>, AppError> {
    Ok(Json(
        DirectoryService::new(state.pool())
            .get_solicitor(SolicitorId::new(id))
            .await?,
    ))
}

#[instrument(skip_all, fields(user_id = %user.id, solicitor_id = id))]
pub async fn replace(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<SolicitorPayload>,
) -> Result<Json<SolicitorView>, AppError> {
    let solicitor = DirectoryService::new(state.pool())
        .update_solicitor(user.id, SolicitorId::new(id), payload, false)
        .await?;
    Ok(Json(solicitor))
}

#[instrument(skip_all, fields(user_id = %user.id, solicitor_id = id))]
pub async fn patch(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<SolicitorPayload>,
) -> Result<Json<SolicitorView>, AppError> {
    let solicitor = DirectoryService::new(state.pool())
        .update_solicitor(user.id, SolicitorId::new(id), payload, true)
        .await?;
    Ok(Json(solicitor))
}

#[instrument(skip_all, fields(user_id = %user.id, solicitor_id = id))]
pub async fn destroy(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    DirectoryService::new(state.pool())
        .delete_solicitor(user.id, SolicitorId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
