use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    extractors::CurrentUser, middleware::metrics::record_vitamin_toggle, models::VitaminStatus,
    AppResult, AppState,
};

/// POST /api/vitamin/toggle - Mark today's vitamin as given, or unmark it
#[utoipa::path(
    post,
    path = "/api/vitamin/toggle",
    responses(
        (status = 200, description = "State after the toggle", body = VitaminStatus),
        (status = 401, description = "Unauthorized")
    ),
    tag = "vitamin",
    security(("cookie_auth" = []))
)]
pub async fn toggle_vitamin(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<VitaminStatus>> {
    let status = state.aggregator.toggle_vitamin(user.id(), Utc::now()).await?;
    record_vitamin_toggle(status.given);

    Ok(Json(status))
}
