use axum::{extract::State, Json};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    extractors::CurrentUser,
    models::{Animal, FoodEntry, FoodType, FoodTypeFilter, VitaminEntry},
    AppResult, AppState,
};

/// Today at a glance, plus what the entry forms need
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub day: NaiveDate,
    pub food_entries: Vec<FoodEntry>,
    pub vitamin: Option<VitaminEntry>,
    pub food_types: Vec<FoodType>,
    pub animals: Vec<Animal>,
}

/// GET /api/dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Today's entries", body = DashboardResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "dashboard",
    security(("cookie_auth" = []))
)]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> AppResult<Json<DashboardResponse>> {
    let now = Utc::now();

    let food_entries = state.aggregator.today_food_entries(now).await?;
    let vitamin = state.aggregator.vitamin_today(now).await?;
    let food_types = state.store.list_food_types(FoodTypeFilter::Visible).await?;
    let animals = state.store.list_animals().await?;

    Ok(Json(DashboardResponse {
        day: state.aggregator.today(now),
        food_entries,
        vitamin,
        food_types,
        animals,
    }))
}
