use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    extractors::CurrentUser,
    middleware::metrics::record_entry_created,
    models::{WeightEntry, WeightEntryInput},
    AppError, AppResult, AppState,
};

async fn check_animal(state: &AppState, animal_id: i32) -> AppResult<()> {
    match state.store.get_animal(animal_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!("Unknown animal {}", animal_id))),
    }
}

/// POST /api/weight-entries
#[utoipa::path(
    post,
    path = "/api/weight-entries",
    request_body = WeightEntryInput,
    responses(
        (status = 200, description = "Weight entry created", body = WeightEntry),
        (status = 422, description = "Non-positive weight or unknown animal")
    ),
    tag = "weight-entries",
    security(("cookie_auth" = []))
)]
pub async fn create_weight_entry(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<WeightEntryInput>,
) -> AppResult<Json<WeightEntry>> {
    let input = input.validate()?;
    check_animal(&state, input.animal_id).await?;

    let entry = state
        .store
        .create_weight_entry(user.id(), &input, Utc::now())
        .await?;
    record_entry_created("weight");

    tracing::info!(
        user_id = user.id(),
        entry_id = entry.id,
        animal = %entry.animal_name,
        value = entry.value,
        "Weight entry created"
    );
    Ok(Json(entry))
}

/// GET /api/weight-entries/{id}
#[utoipa::path(
    get,
    path = "/api/weight-entries/{id}",
    params(
        ("id" = i32, Path, description = "Weight entry ID")
    ),
    responses(
        (status = 200, description = "Weight entry", body = WeightEntry),
        (status = 404, description = "Weight entry not found")
    ),
    tag = "weight-entries",
    security(("cookie_auth" = []))
)]
pub async fn get_weight_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    _user: CurrentUser,
) -> AppResult<Json<WeightEntry>> {
    state
        .store
        .get_weight_entry(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Weight entry {} not found", id)))
}

/// PUT /api/weight-entries/{id}
#[utoipa::path(
    put,
    path = "/api/weight-entries/{id}",
    params(
        ("id" = i32, Path, description = "Weight entry ID")
    ),
    request_body = WeightEntryInput,
    responses(
        (status = 200, description = "Weight entry replaced", body = WeightEntry),
        (status = 404, description = "Weight entry not found"),
        (status = 422, description = "Non-positive weight or unknown animal")
    ),
    tag = "weight-entries",
    security(("cookie_auth" = []))
)]
pub async fn update_weight_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    user: CurrentUser,
    Json(input): Json<WeightEntryInput>,
) -> AppResult<Json<WeightEntry>> {
    let input = input.validate()?;
    check_animal(&state, input.animal_id).await?;

    let entry = state
        .store
        .update_weight_entry(id, user.id(), &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Weight entry {} not found", id)))?;

    tracing::info!(user_id = user.id(), entry_id = id, "Weight entry updated");
    Ok(Json(entry))
}
