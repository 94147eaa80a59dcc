use chrono::{DateTime, Utc};
use common::storage::ContentHash;
use serde::{Deserialize, Serialize};

use crate::entity::files;
use crate::error::RepoError;

/// Metadata describing one stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FileRecord {
    #[schema(example = 1)]
    pub id: i32,
    /// Display name; also used to guess the download content type.
    pub name: String,
    /// Origin of the bytes: the uploaded filename or the source URL.
    pub path: String,
    pub size: i64,
    /// Hex digest of the content, 64 lowercase characters.
    #[schema(value_type = String, example = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")]
    pub sha256: ContentHash,
    pub updated: DateTime<Utc>,
}

impl TryFrom<files::Model> for FileRecord {
    type Error = RepoError;

    fn try_from(model: files::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            sha256: ContentHash::from_hex(&model.sha256)?,
            id: model.id,
            name: model.name,
            path: model.path,
            size: model.size,
            updated: model.updated,
        })
    }
}

/// Row to insert after the bytes have been ingested.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub path: String,
    pub size: i64,
    pub sha256: ContentHash,
}

/// Replacement descriptive fields. Digest and size never change.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct FileUpdate {
    pub name: String,
    pub path: String,
}
