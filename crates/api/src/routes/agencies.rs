//! Agency handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use estate_desk_core::AgencyId;

use crate::{
    error::AppError,
    extract::{PathId, Payload},
    middleware::RequireAuth,
    models::AgencyView,
    models::agency::AgencyPayload,
    services::DirectoryService,
    state::AppState,
};

/// Build the agency router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/agencies", get(list).post(create))
        .route(
            "/agencies/{id}",
            get(show).put(replace).patch(patch).delete(destroy),
        )
}

pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<AgencyView>>, AppError> {
    Ok(Json(DirectoryService::new(state.pool()).list_agencies().await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Payload(payload): Payload<AgencyPayload>,
) -> Result<(StatusCode, Json<AgencyView>), AppError> {
    let agency = DirectoryService::new(state.pool())
        .create_agency(user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(agency)))
}

pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<AgencyView>, AppError> {
    Ok(Json(
        DirectoryService::new(state.pool())
            .get_agency(AgencyId::new(id))
            .await?,
    ))
}

#[instrument(skip_all, fields(user_id = %user.id, agency_id = id))]
pub async fn replace(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<AgencyPayload>,
) -> Result<Json<AgencyView>, AppError> {
    let agency = DirectoryService::new(state.pool())
        .update_agency(user.id, AgencyId::new(id), payload, false)
        .await?;
    Ok(Json(agency))
}

#[instrument(skip_all, fields(user_id = %user.id, agency_id = id))]
pub async fn patch(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<AgencyPayload>,
) -> Result<Json<AgencyView>, AppError> {
    let agency = DirectoryService::new(state.pool())
        .update_agency(user.id, AgencyId::new(id), payload, true)
        .await?;
    Ok(Json(agency))
}

#[instrument(skip_all, fields(user_id = %user.id, agency_id = id))]
pub async fn destroy(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    DirectoryService::new(state.pool())
        .delete_agency(user.id, AgencyId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
