use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Failure categories surfaced by every store and repository operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Storage,
    Transaction,
    UpstreamFetch,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Storage => "STORAGE_ERROR",
            ErrorKind::Transaction => "TRANSACTION_ERROR",
            ErrorKind::UpstreamFetch => "UPSTREAM_FETCH_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the blob store, the metadata repository and the
/// document service. None of these are retried internally.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Digest or key already present.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown id or key, or an update/delete that touched no row.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem failure while staging, renaming, reading or removing a blob.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The metadata store failed to begin, run, commit or roll back.
    #[error("metadata store failure: {0}")]
    Transaction(String),

    /// A remote ingest reference could not be retrieved.
    #[error("remote fetch failed: {0}")]
    UpstreamFetch(String),
}

pub type Result<T> = std::result::Result<T, RepoError>;

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::Validation(_) => ErrorKind::Validation,
            RepoError::Conflict(_) => ErrorKind::Conflict,
            RepoError::NotFound(_) => ErrorKind::NotFound,
            RepoError::Storage(_) => ErrorKind::Storage,
            RepoError::Transaction(_) => ErrorKind::Transaction,
            RepoError::UpstreamFetch(_) => ErrorKind::UpstreamFetch,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RepoError::Validation(msg)
            | RepoError::Conflict(msg)
            | RepoError::NotFound(msg)
            | RepoError::Storage(msg)
            | RepoError::Transaction(msg)
            | RepoError::UpstreamFetch(msg) => msg,
        }
    }

    /// Classify a failed insert, reporting a unique-constraint violation as a
    /// conflict described by `conflict_msg`.
    pub fn from_insert(err: DbErr, conflict_msg: impl FnOnce() -> String) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => RepoError::Conflict(conflict_msg()),
            _ => err.into(),
        }
    }
}

impl From<DbErr> for RepoError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => RepoError::Conflict(detail),
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => RepoError::Validation(detail),
            _ => match err {
                DbErr::RecordNotFound(detail) => RepoError::NotFound(detail),
                DbErr::RecordNotUpdated => RepoError::NotFound("no row was updated".into()),
                other => RepoError::Transaction(other.to_string()),
            },
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Missing(hash) => RepoError::NotFound(format!("blob {hash}")),
            StorageError::MalformedDigest(msg) => RepoError::Validation(msg),
            e @ StorageError::TooLarge { .. } => RepoError::Validation(e.to_string()),
            e @ StorageError::Io(_) => RepoError::Storage(e.to_string()),
        }
    }
}

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `CONFLICT`,
    /// `NOT_FOUND`, `STORAGE_ERROR`, `TRANSACTION_ERROR`, `UPSTREAM_FETCH_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "file 42")]
    pub message: String,
}

/// HTTP-facing error.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal { kind: ErrorKind, detail: String },
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: ErrorKind::Validation.as_str(),
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: ErrorKind::NotFound.as_str(),
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: ErrorKind::Conflict.as_str(),
                    message: msg,
                },
            ),
            AppError::BadGateway(msg) => {
                tracing::warn!("Upstream fetch failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: ErrorKind::UpstreamFetch.as_str(),
                        message: msg,
                    },
                )
            }
            AppError::Internal { kind, detail } => {
                tracing::error!(kind = %kind, "Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: kind.as_str(),
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        let kind = err.kind();
        match err {
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::UpstreamFetch(msg) => AppError::BadGateway(msg),
            RepoError::Storage(detail) | RepoError::Transaction(detail) => {
                AppError::Internal { kind, detail }
            }
        }
    }
}
