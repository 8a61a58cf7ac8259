//! Loan application handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use estate_desk_core::ApplicationId;

use crate::{
    error::AppError,
    extract::{PathId, Payload, QueryParams},
    middleware::RequireAuth,
    models::application::{ApplicationFilter, ApplicationPayload},
    models::{ApplicationDetail, ApplicationSummary},
    services::ApplicationService,
    state::AppState,
};

/// Build the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list).post(create))
        .route(
            "/applications/{id}",
            get(show).put(replace).patch(patch).delete(destroy),
        )
}

/// List applications, newest first; `?agency=<id>` narrows to one agency.
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ApplicationFilter>,
) -> Result<Json<Vec<ApplicationSummary>>, AppError> {
    Ok(Json(ApplicationService::new(state.pool()).list(filter).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Payload(payload): Payload<ApplicationPayload>,
) -> Result<(StatusCode, Json<ApplicationDetail>), AppError> {
    let application = ApplicationService::new(state.pool())
        .create(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<ApplicationDetail>, AppError> {
    Ok(Json(
        ApplicationService::new(state.pool())
            .get(ApplicationId::new(id))
            .await?,
    ))
}

#[instrument(skip_all, fields(user_id = %user.id, application_id = id))]
pub async fn replace(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<ApplicationPayload>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let application = ApplicationService::new(state.pool())
        .update(&user, ApplicationId::new(id), payload, false)
        .await?;
    Ok(Json(application))
}

#[instrument(skip_all, fields(user_id = %user.id, application_id = id))]
pub async fn patch(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<ApplicationPayload>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let application = ApplicationService::new(state.pool())
        .update(&user, ApplicationId::new(id), payload, true)
        .await?;
    Ok(Json(application))
}

#[instrument(skip_all, fields(user_id = %user.id, application_id = id))]
pub async fn destroy(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    ApplicationService::new(state.pool())
        .delete(&user, ApplicationId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
