use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    extractors::CurrentUser,
    models::{Animal, FoodType, FoodTypeFilter},
    AppResult, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub title: String,
    pub food_types: Vec<FoodType>,
    pub animals: Vec<Animal>,
}

/// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "All food types and animals", body = SettingsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "settings",
    security(("cookie_auth" = []))
)]
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> AppResult<Json<SettingsResponse>> {
    Ok(Json(SettingsResponse {
        title: state.config.title.clone(),
        food_types: state.store.list_food_types(FoodTypeFilter::All).await?,
        animals: state.store.list_animals().await?,
    }))
}
