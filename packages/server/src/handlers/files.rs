use std::path::{Path as FsPath, PathBuf};

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::storage::BoxReader;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody, ErrorKind};
use crate::extractors::json::{AppJson, AppPath};
use crate::ingest::{IngestSource, InlineUpload};
use crate::models::file::{FileRecord, FileUpdate};
use crate::service::FileUpload;
use crate::state::AppState;

pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    // Leave room for the multipart framing and the text fields.
    let limit = usize::try_from(max_blob_size)
        .unwrap_or(usize::MAX)
        .saturating_add(64 * 1024);
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    get,
    path = "/api/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List files, most recently updated first",
    responses(
        (status = 200, description = "All files", body = Vec<FileRecord>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileRecord>>, AppError> {
    Ok(Json(state.service.list_files().await?))
}

/// Create a file from either an uploaded `file` part or a `path` part
/// holding an http(s) URL. An optional `name` part sets the display name.
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "Files",
    operation_id = "createFile",
    summary = "Store a file from an upload or an http(s) URL",
    request_body(
        content_type = "multipart/form-data",
        description = "`file` part or `path` part, optional `name` part"
    ),
    responses(
        (status = 201, description = "File created", body = FileRecord),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Content already exists (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Remote fetch failed (UPSTREAM_FETCH_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut spooled: Option<SpooledUpload> = None;
    let mut reference: Option<String> = None;
    let mut name: Option<String> = None;

    let result: Result<FileRecord, AppError> = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("file") => {
                    if spooled.is_some() {
                        return Err(AppError::Validation("Only one 'file' field is allowed".into()));
                    }
                    let filename = field
                        .file_name()
                        .map(|s| s.to_string())
                        .filter(|s| !s.trim().is_empty())
                        .ok_or_else(|| {
                            AppError::Validation("File field must have a filename".into())
                        })?;
                    let temp_path = upload_temp_path();
                    // Record the path first so a failed spool is still cleaned up.
                    spooled = Some(SpooledUpload {
                        filename,
                        temp_path: temp_path.clone(),
                    });
                    spool_field(field, &temp_path, state.config.storage.max_blob_size).await?;
                }
                Some("path") => reference = Some(read_text(field, "path").await?),
                Some("name") => name = Some(read_text(field, "name").await?),
                _ => {} // Ignore unknown fields.
            }
        }

        let inline = match &spooled {
            Some(upload) => {
                let file = tokio::fs::File::open(&upload.temp_path).await.map_err(|e| {
                    AppError::Internal {
                        kind: ErrorKind::Storage,
                        detail: format!("Failed to reopen upload spool: {e}"),
                    }
                })?;
                let reader: BoxReader = Box::new(file);
                Some(InlineUpload {
                    filename: upload.filename.clone(),
                    reader,
                })
            }
            None => None,
        };

        let source = IngestSource::from_parts(reference.take(), inline)?;
        let upload = FileUpload {
            name: name.take(),
            source,
        };
        Ok(state.service.create_file(upload).await?)
    }
    .await;

    if let Some(upload) = &spooled {
        // Best effort.
        let _ = tokio::fs::remove_file(&upload.temp_path).await;
    }

    let record = result?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get a file record",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File record", body = FileRecord),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<FileRecord>, AppError> {
    Ok(Json(state.service.get_file(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/files/{id}",
    tag = "Files",
    operation_id = "updateFile",
    summary = "Replace the name and origin of a file",
    params(("id" = i32, Path, description = "File ID")),
    request_body = FileUpdate,
    responses(
        (status = 200, description = "File updated", body = FileRecord),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, update))]
pub async fn update_file(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(update): AppJson<FileUpdate>,
) -> Result<Json<FileRecord>, AppError> {
    Ok(Json(state.service.update_file(id, update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file record and its content",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "Removed file record", body = FileRecord),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_file(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<FileRecord>, AppError> {
    Ok(Json(state.service.delete_file(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}/content",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Stream the content of a file",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_file(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Response, AppError> {
    let (record, reader) = state.service.open_file(id).await?;
    blob_response(&record, reader)
}

#[utoipa::path(
    get,
    path = "/api/files/by-name/{name}/content",
    tag = "Files",
    operation_id = "downloadFileByName",
    summary = "Stream the most recent file with a display name",
    params(("name" = String, Path, description = "Display name")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_file_by_name(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> Result<Response, AppError> {
    let (record, reader) = state.service.open_file_by_name(&name).await?;
    blob_response(&record, reader)
}

struct SpooledUpload {
    filename: String,
    temp_path: PathBuf,
}

fn upload_temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("docstore-upload-{}", Uuid::new_v4()))
}

async fn read_text(field: Field<'_>, label: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {label}: {e}")))
}

/// Copy a multipart field to `temp_path` so the remaining fields can be read
/// before the bytes are ingested.
async fn spool_field(
    mut field: Field<'_>,
    temp_path: &FsPath,
    max_size: u64,
) -> Result<(), AppError> {
    let spool_error = |e: std::io::Error| AppError::Internal {
        kind: ErrorKind::Storage,
        detail: format!("Upload spool failed: {e}"),
    };

    let mut temp_file = tokio::fs::File::create(temp_path)
        .await
        .map_err(spool_error)?;
    let mut total_size: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        total_size += chunk.len() as u64;
        if total_size > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        temp_file.write_all(&chunk).await.map_err(spool_error)?;
    }

    temp_file.flush().await.map_err(spool_error)?;
    Ok(())
}

fn blob_response(record: &FileRecord, reader: BoxReader) -> Result<Response, AppError> {
    let content_type = mime_guess::from_path(&record.name)
        .first_or_octet_stream()
        .to_string();
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, record.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&record.name),
        )
        .body(body)
        .map_err(|e| AppError::Internal {
            kind: ErrorKind::Storage,
            detail: format!("Failed to build response: {e}"),
        })
}

/// RFC 5987 `attr-char` minus alphanumerics.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Inline disposition carrying the display name, with an ASCII fallback.
fn content_disposition_value(name: &str) -> String {
    let ascii_safe: String = name
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = match ascii_safe.trim() {
        "" => "download",
        trimmed => trimmed,
    };
    let encoded = utf8_percent_encode(name, ATTR_CHAR);

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
