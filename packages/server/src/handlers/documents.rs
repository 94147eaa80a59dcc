use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::{AppJson, AppPath, AppQuery};
use crate::models::document::{
    DocumentPayload, JsonDocument, NewTypedDocument, TypedDocumentQuery, TypedDocumentSummary,
    TypedJsonDocument,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/json-data/{key}",
    tag = "JSON Data",
    operation_id = "createJsonData",
    summary = "Store a JSON document under a key",
    params(("key" = String, Path, description = "Document key")),
    request_body = DocumentPayload,
    responses(
        (status = 201, description = "Document created", body = JsonDocument),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Document already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_document(
    State(state): State<AppState>,
    AppPath(key): AppPath<String>,
    AppJson(payload): AppJson<DocumentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.service.create_document(&key, payload.data).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/api/json-data/{key}",
    tag = "JSON Data",
    operation_id = "getJsonData",
    summary = "Get a JSON document",
    params(("key" = String, Path, description = "Document key")),
    responses(
        (status = 200, description = "Document", body = JsonDocument),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_document(
    State(state): State<AppState>,
    AppPath(key): AppPath<String>,
) -> Result<Json<JsonDocument>, AppError> {
    Ok(Json(state.service.get_document(&key).await?))
}

#[utoipa::path(
    put,
    path = "/api/json-data/{key}",
    tag = "JSON Data",
    operation_id = "updateJsonData",
    summary = "Replace the payload of a JSON document",
    params(("key" = String, Path, description = "Document key")),
    request_body = DocumentPayload,
    responses(
        (status = 200, description = "Document updated", body = JsonDocument),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_document(
    State(state): State<AppState>,
    AppPath(key): AppPath<String>,
    AppJson(payload): AppJson<DocumentPayload>,
) -> Result<Json<JsonDocument>, AppError> {
    Ok(Json(state.service.update_document(&key, payload.data).await?))
}

#[utoipa::path(
    delete,
    path = "/api/json-data/{key}",
    tag = "JSON Data",
    operation_id = "deleteJsonData",
    summary = "Delete a JSON document",
    params(("key" = String, Path, description = "Document key")),
    responses(
        (status = 200, description = "Removed document", body = JsonDocument),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    AppPath(key): AppPath<String>,
) -> Result<Json<JsonDocument>, AppError> {
    Ok(Json(state.service.delete_document(&key).await?))
}

#[utoipa::path(
    get,
    path = "/api/typed-json-data",
    tag = "Typed JSON Data",
    operation_id = "listTypedJsonData",
    summary = "List typed documents without payloads",
    params(TypedDocumentQuery),
    responses(
        (status = 200, description = "Document summaries", body = Vec<TypedDocumentSummary>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_typed_documents(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TypedDocumentQuery>,
) -> Result<Json<Vec<TypedDocumentSummary>>, AppError> {
    let type_filter = query.doc_type.as_deref().filter(|t| !t.is_empty());
    Ok(Json(state.service.list_typed_documents(type_filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/typed-json-data",
    tag = "Typed JSON Data",
    operation_id = "createTypedJsonData",
    summary = "Store a typed JSON document",
    request_body = NewTypedDocument,
    responses(
        (status = 201, description = "Document created", body = TypedJsonDocument),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Document already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, new), fields(key = %new.key))]
pub async fn create_typed_document(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewTypedDocument>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.service.create_typed_document(new).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/api/typed-json-data/{key}",
    tag = "Typed JSON Data",
    operation_id = "getTypedJsonData",
    summary = "Get a typed JSON document",
    params(("key" = String, Path, description = "Document key")),
    responses(
        (status = 200, description = "Document", body = TypedJsonDocument),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_typed_document(
    State(state): State<AppState>,
    AppPath(key): AppPath<String>,
) -> Result<Json<TypedJsonDocument>, AppError> {
    Ok(Json(state.service.get_typed_document(&key).await?))
}

#[utoipa::path(
    put,
    path = "/api/typed-json-data/{key}",
    tag = "Typed JSON Data",
    operation_id = "updateTypedJsonData",
    summary = "Replace the payload of a typed JSON document",
    params(("key" = String, Path, description = "Document key")),
    request_body = DocumentPayload,
    responses(
        (status = 200, description = "Document updated", body = TypedJsonDocument),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_typed_document(
    State(state): State<AppState>,
    AppPath(key): AppPath<String>,
    AppJson(payload): AppJson<DocumentPayload>,
) -> Result<Json<TypedJsonDocument>, AppError> {
    Ok(Json(
        state
            .service
            .update_typed_document(&key, payload.data)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/typed-json-data/{key}",
    tag = "Typed JSON Data",
    operation_id = "deleteTypedJsonData",
    summary = "Delete a typed JSON document",
    params(("key" = String, Path, description = "Document key")),
    responses(
        (status = 200, description = "Removed document", body = TypedJsonDocument),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_typed_document(
    State(state): State<AppState>,
    AppPath(key): AppPath<String>,
) -> Result<Json<TypedJsonDocument>, AppError> {
    Ok(Json(state.service.delete_typed_document(&key).await?))
}
