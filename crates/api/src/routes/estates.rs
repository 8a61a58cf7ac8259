//! Estate handlers, plus the individual asset, expense and dispute endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use estate_desk_core::{AssetId, DisputeId, EstateId, ExpenseId};

use crate::{
    error::AppError,
    extract::{PathId, Payload},
    middleware::RequireAuth,
    models::estate::{AssetPayload, DisputePayload, EstatePayload, ExpensePayload},
    models::{Asset, Dispute, Estate, Expense},
    services::EstateService,
    state::AppState,
};

/// Build the estate router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/estates", get(list).post(create))
        .route("/estates/{id}", get(show).delete(destroy))
        .route(
            "/assets/{id}",
            get(show_asset)
                .put(replace_asset)
                .patch(patch_asset)
                .delete(destroy_asset),
        )
        .route(
            "/expenses/{id}",
            get(show_expense)
                .put(replace_expense)
                .patch(patch_expense)
                .delete(destroy_expense),
        )
        .route(
            "/disputes/{id}",
            get(show_dispute)
                .put(replace_dispute)
                .patch(patch_dispute)
                .delete(destroy_dispute),
        )
}

// =============================================================================
// Estates
// =============================================================================

pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Estate>>, AppError> {
    Ok(Json(EstateService::new(state.pool()).list().await?))
}

/// Create an estate with its assets, expenses and disputes in one go.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Payload(payload): Payload<EstatePayload>,
) -> Result<(StatusCode, Json<Estate>), AppError> {
    let estate = EstateService::new(state.pool()).create(payload).await?;
    Ok((StatusCode::CREATED, Json(estate)))
}

pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Estate>, AppError> {
    Ok(Json(EstateService::new(state.pool()).get(EstateId::new(id)).await?))
}

#[instrument(skip_all, fields(user_id = %user.id, estate_id = id))]
pub async fn destroy(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    EstateService::new(state.pool())
        .delete(EstateId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Assets
// =============================================================================

pub async fn show_asset(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Asset>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .get_asset(AssetId::new(id))
            .await?,
    ))
}

pub async fn replace_asset(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<AssetPayload>,
) -> Result<Json<Asset>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .update_asset(AssetId::new(id), payload, false)
            .await?,
    ))
}

pub async fn patch_asset(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<AssetPayload>,
) -> Result<Json<Asset>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .update_asset(AssetId::new(id), payload, true)
            .await?,
    ))
}

pub async fn destroy_asset(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    EstateService::new(state.pool())
        .delete_asset(AssetId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Expenses
// =============================================================================

pub async fn show_expense(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .get_expense(ExpenseId::new(id))
            .await?,
    ))
}

pub async fn replace_expense(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<ExpensePayload>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .update_expense(ExpenseId::new(id), payload, false)
            .await?,
    ))
}

pub async fn patch_expense(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<ExpensePayload>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .update_expense(ExpenseId::new(id), payload, true)
            .await?,
    ))
}

pub async fn destroy_expense(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    EstateService::new(state.pool())
        .delete_expense(ExpenseId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Disputes
// =============================================================================

pub async fn show_dispute(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Dispute>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .get_dispute(DisputeId::new(id))
            .await?,
    ))
}

pub async fn replace_dispute(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<DisputePayload>,
) -> Result<Json<Dispute>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .update_dispute(DisputeId::new(id), payload, false)
            .await?,
    ))
}

pub async fn patch_dispute(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
    Payload(payload): Payload<DisputePayload>,
) -> Result<Json<Dispute>, AppError> {
    Ok(Json(
        EstateService::new(state.pool())
            .update_dispute(DisputeId::new(id), payload, true)
            .await?,
    ))
}

pub async fn destroy_dispute(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    EstateService::new(state.pool())
        .delete_dispute(DisputeId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
