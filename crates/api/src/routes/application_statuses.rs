//! Application status lookup.

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    db, error::AppError, middleware::RequireAuth, models::ApplicationStatus, state::AppState,
};

/// Build the status router.
pub fn router() -> Router<AppState> {
    Router::new().route("/application-statuses", get(list))
}

/// List every status in id order.
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationStatus>>, AppError> {
    Ok(Json(db::application_statuses::list_all(state.pool()).await?))
}
