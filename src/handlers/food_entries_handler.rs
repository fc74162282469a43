use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    db::EntryStore,
    extractors::CurrentUser,
    middleware::metrics::record_entry_created,
    models::{FoodEntry, FoodEntryInput, FoodEntryMutationResponse},
    AppError, AppResult, AppState,
};

/// Checks the references of a food entry. A hidden food type is only
/// accepted when the entry already uses it.
async fn check_references(
    store: &dyn EntryStore,
    input: &FoodEntryInput,
    current_food_type_id: Option<i32>,
) -> AppResult<()> {
    let food_type = store
        .get_food_type(input.food_type_id)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown food type {}", input.food_type_id)))?;

    if food_type.is_hidden && current_food_type_id != Some(food_type.id) {
        return Err(AppError::Validation(format!(
            "Food type {} is hidden",
            food_type.label
        )));
    }

    for &animal_id in &input.animal_ids {
        if store.get_animal(animal_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown animal {}", animal_id)));
        }
    }

    Ok(())
}

/// POST /api/food-entries
#[utoipa::path(
    post,
    path = "/api/food-entries",
    request_body = FoodEntryInput,
    responses(
        (status = 200, description = "Food entry created", body = FoodEntry),
        (status = 422, description = "Unknown or hidden food type, or unknown animal")
    ),
    tag = "food-entries",
    security(("cookie_auth" = []))
)]
pub async fn create_food_entry(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<FoodEntryInput>,
) -> AppResult<Json<FoodEntry>> {
    let input = input.validate()?;
    check_references(state.store.as_ref(), &input, None).await?;

    let entry = state
        .store
        .create_food_entry(user.id(), &input, Utc::now())
        .await?;
    record_entry_created("food");

    tracing::info!(
        user_id = user.id(),
        entry_id = entry.id,
        food_type = %entry.food_type_label,
        animals = entry.animals.len(),
        "Food entry created"
    );
    Ok(Json(entry))
}

/// GET /api/food-entries/{id}
#[utoipa::path(
    get,
    path = "/api/food-entries/{id}",
    params(
        ("id" = i32, Path, description = "Food entry ID")
    ),
    responses(
        (status = 200, description = "Food entry", body = FoodEntry),
        (status = 404, description = "Food entry not found")
    ),
    tag = "food-entries",
    security(("cookie_auth" = []))
)]
pub async fn get_food_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    _user: CurrentUser,
) -> AppResult<Json<FoodEntry>> {
    state
        .store
        .get_food_entry(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Food entry {} not found", id)))
}

/// PUT /api/food-entries/{id} - Replace an entry; it keeps its timestamp
#[utoipa::path(
    put,
    path = "/api/food-entries/{id}",
    params(
        ("id" = i32, Path, description = "Food entry ID")
    ),
    request_body = FoodEntryInput,
    responses(
        (status = 200, description = "Food entry replaced", body = FoodEntry),
        (status = 404, description = "Food entry not found"),
        (status = 422, description = "Unknown or hidden food type, or unknown animal")
    ),
    tag = "food-entries",
    security(("cookie_auth" = []))
)]
pub async fn update_food_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    user: CurrentUser,
    Json(input): Json<FoodEntryInput>,
) -> AppResult<Json<FoodEntry>> {
    let input = input.validate()?;

    let existing = state
        .store
        .get_food_entry(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food entry {} not found", id)))?;
    check_references(state.store.as_ref(), &input, Some(existing.food_type_id)).await?;

    let entry = state
        .store
        .update_food_entry(id, user.id(), &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food entry {} not found", id)))?;

    tracing::info!(user_id = user.id(), entry_id = id, "Food entry updated");
    Ok(Json(entry))
}

/// DELETE /api/food-entries/{id}
#[utoipa::path(
    delete,
    path = "/api/food-entries/{id}",
    params(
        ("id" = i32, Path, description = "Food entry ID")
    ),
    responses(
        (status = 200, description = "Food entry deleted", body = FoodEntryMutationResponse),
        (status = 404, description = "Food entry not found")
    ),
    tag = "food-entries",
    security(("cookie_auth" = []))
)]
pub async fn delete_food_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    user: CurrentUser,
) -> AppResult<Json<FoodEntryMutationResponse>> {
    if !state.store.delete_food_entry(id).await? {
        return Err(AppError::NotFound(format!("Food entry {} not found", id)));
    }

    tracing::info!(user_id = user.id(), entry_id = id, "Food entry deleted");
    Ok(Json(FoodEntryMutationResponse {
        success: true,
        message: Some("Food entry deleted successfully".to_string()),
    }))
}
