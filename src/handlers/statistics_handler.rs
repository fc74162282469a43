use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{extractors::CurrentUser, models::StatisticsResponse, AppResult, AppState};

/// GET /api/statistics
#[utoipa::path(
    get,
    path = "/api/statistics",
    responses(
        (status = 200, description = "Food statistics and latest weights", body = StatisticsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "statistics",
    security(("cookie_auth" = []))
)]
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> AppResult<Json<StatisticsResponse>> {
    let food = state.aggregator.food_statistics().await?;
    let weights = state.aggregator.latest_weights().await?;

    Ok(Json(StatisticsResponse { food, weights }))
}
