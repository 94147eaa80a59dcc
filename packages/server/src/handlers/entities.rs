use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::{AppJson, AppPath};
use crate::models::entity::{EntityInput, EntityRecord};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/entities",
    tag = "Entities",
    operation_id = "listEntities",
    summary = "List entities, least recently updated first",
    responses(
        (status = 200, description = "All entities", body = Vec<EntityRecord>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_entities(
    State(state): State<AppState>,
) -> Result<Json<Vec<EntityRecord>>, AppError> {
    Ok(Json(state.service.list_entities().await?))
}

#[utoipa::path(
    post,
    path = "/api/entities",
    tag = "Entities",
    operation_id = "createEntity",
    summary = "Create an entity with its labels and matches",
    request_body = EntityInput,
    responses(
        (status = 201, description = "Entity created", body = EntityRecord),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Entity already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, input), fields(entity_id = %input.id))]
pub async fn create_entity(
    State(state): State<AppState>,
    AppJson(input): AppJson<EntityInput>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.service.create_entity(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/entities/{id}",
    tag = "Entities",
    operation_id = "getEntity",
    summary = "Get an entity",
    params(("id" = String, Path, description = "Entity ID")),
    responses(
        (status = 200, description = "Entity", body = EntityRecord),
        (status = 404, description = "Entity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_entity(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<EntityRecord>, AppError> {
    Ok(Json(state.service.get_entity(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/entities/{id}",
    tag = "Entities",
    operation_id = "updateEntity",
    summary = "Replace the type, labels and matches of an entity",
    params(("id" = String, Path, description = "Entity ID")),
    request_body = EntityInput,
    responses(
        (status = 200, description = "Entity updated", body = EntityRecord),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Entity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, input))]
pub async fn update_entity(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<EntityInput>,
) -> Result<Json<EntityRecord>, AppError> {
    Ok(Json(state.service.update_entity(&id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/api/entities/{id}",
    tag = "Entities",
    operation_id = "deleteEntity",
    summary = "Delete an entity",
    params(("id" = String, Path, description = "Entity ID")),
    responses(
        (status = 200, description = "Removed entity", body = EntityRecord),
        (status = 404, description = "Entity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_entity(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<EntityRecord>, AppError> {
    Ok(Json(state.service.delete_entity(&id).await?))
}
