use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    extractors::CurrentUser,
    models::{FoodType, FoodTypeFilter, FoodTypeInput},
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FoodTypesQuery {
    /// Leave out hidden types
    #[serde(default)]
    pub visible_only: bool,
}

/// GET /api/food-types?visible_only=
#[utoipa::path(
    get,
    path = "/api/food-types",
    params(FoodTypesQuery),
    responses(
        (status = 200, description = "Food types by label", body = Vec<FoodType>)
    ),
    tag = "food-types",
    security(("cookie_auth" = []))
)]
pub async fn get_food_types(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<FoodTypesQuery>,
) -> AppResult<Json<Vec<FoodType>>> {
    let filter = if query.visible_only {
        FoodTypeFilter::Visible
    } else {
        FoodTypeFilter::All
    };

    Ok(Json(state.store.list_food_types(filter).await?))
}

/// POST /api/food-types
#[utoipa::path(
    post,
    path = "/api/food-types",
    request_body = FoodTypeInput,
    responses(
        (status = 200, description = "Food type created", body = FoodType),
        (status = 422, description = "Invalid label or recommendations")
    ),
    tag = "food-types",
    security(("cookie_auth" = []))
)]
pub async fn create_food_type(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<FoodTypeInput>,
) -> AppResult<Json<FoodType>> {
    let input = input.validate()?;
    let food_type = state.store.create_food_type(&input).await?;

    tracing::info!(
        user_id = user.id(),
        food_type_id = food_type.id,
        label = %food_type.label,
        "Food type created"
    );
    Ok(Json(food_type))
}

/// PUT /api/food-types/{id}
#[utoipa::path(
    put,
    path = "/api/food-types/{id}",
    params(
        ("id" = i32, Path, description = "Food type ID")
    ),
    request_body = FoodTypeInput,
    responses(
        (status = 200, description = "Food type replaced", body = FoodType),
        (status = 404, description = "Food type not found"),
        (status = 422, description = "Invalid label or recommendations")
    ),
    tag = "food-types",
    security(("cookie_auth" = []))
)]
pub async fn update_food_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    _user: CurrentUser,
    Json(input): Json<FoodTypeInput>,
) -> AppResult<Json<FoodType>> {
    let input = input.validate()?;

    state
        .store
        .update_food_type(id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Food type {} not found", id)))
}
