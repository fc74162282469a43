use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::CurrentUser,
    models::{Animal, AnimalInput},
    AppError, AppResult, AppState,
};

/// GET /api/animals
#[utoipa::path(
    get,
    path = "/api/animals",
    responses(
        (status = 200, description = "Animals by name", body = Vec<Animal>)
    ),
    tag = "animals",
    security(("cookie_auth" = []))
)]
pub async fn get_animals(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<Animal>>> {
    Ok(Json(state.store.list_animals().await?))
}

/// POST /api/animals
#[utoipa::path(
    post,
    path = "/api/animals",
    request_body = AnimalInput,
    responses(
        (status = 200, description = "Animal created", body = Animal),
        (status = 422, description = "Invalid name")
    ),
    tag = "animals",
    security(("cookie_auth" = []))
)]
pub async fn create_animal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<AnimalInput>,
) -> AppResult<Json<Animal>> {
    let input = input.validate()?;
    let animal = state.store.create_animal(&input).await?;

    tracing::info!(user_id = user.id(), animal_id = animal.id, name = %animal.name, "Animal created");
    Ok(Json(animal))
}

/// PUT /api/animals/{id}
#[utoipa::path(
    put,
    path = "/api/animals/{id}",
    params(
        ("id" = i32, Path, description = "Animal ID")
    ),
    request_body = AnimalInput,
    responses(
        (status = 200, description = "Animal renamed", body = Animal),
        (status = 404, description = "Animal not found"),
        (status = 422, description = "Invalid name")
    ),
    tag = "animals",
    security(("cookie_auth" = []))
)]
pub async fn update_animal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    _user: CurrentUser,
    Json(input): Json<AnimalInput>,
) -> AppResult<Json<Animal>> {
    let input = input.validate()?;

    state
        .store
        .update_animal(id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Animal {} not found", id)))
}
