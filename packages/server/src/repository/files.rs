use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::warn;

use super::{MetadataRepository, expect_single_row, require_non_empty};
use crate::entity::files;
use crate::error::{RepoError, Result};
use crate::models::file::{FileRecord, FileUpdate, NewFile};

impl MetadataRepository {
    /// Record a blob that has already been ingested.
    ///
    /// Fails with `Conflict` if a record for the same digest exists. The
    /// unique index on `sha256` backs the pre-check.
    pub async fn create_file(&self, new: NewFile) -> Result<FileRecord> {
        require_non_empty(&new.name, "name")?;
        let hex = new.sha256.to_hex();

        if let Some(existing) = files::Entity::find()
            .filter(files::Column::Sha256.eq(&hex))
            .one(&self.db)
            .await?
        {
            return Err(RepoError::Conflict(format!(
                "content {hex} is already stored as file {}",
                existing.id
            )));
        }

        let model = files::ActiveModel {
            name: Set(new.name),
            path: Set(new.path),
            size: Set(new.size),
            sha256: Set(hex.clone()),
            updated: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepoError::from_insert(e, || format!("content {hex} is already stored")))?;

        model.try_into()
    }

    pub async fn get_file(&self, id: i32) -> Result<FileRecord> {
        files::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("file {id}")))?
            .try_into()
    }

    /// Most recently updated file carrying `name`.
    pub async fn get_file_by_name(&self, name: &str) -> Result<FileRecord> {
        files::Entity::find()
            .filter(files::Column::Name.eq(name))
            .order_by_desc(files::Column::Updated)
            .order_by_desc(files::Column::Id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("file named {name:?}")))?
            .try_into()
    }

    /// All files, most recently updated first.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let models = files::Entity::find()
            .order_by_desc(files::Column::Updated)
            .order_by_desc(files::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(FileRecord::try_from).collect()
    }

    /// Replace the descriptive fields of a file. Digest, size and blob bytes
    /// stay untouched.
    pub async fn update_file(&self, id: i32, update: FileUpdate) -> Result<FileRecord> {
        require_non_empty(&update.name, "name")?;

        let result = files::Entity::update_many()
            .col_expr(files::Column::Name, Expr::value(update.name))
            .col_expr(files::Column::Path, Expr::value(update.path))
            .col_expr(files::Column::Updated, Expr::value(Utc::now()))
            .filter(files::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        expect_single_row(result.rows_affected, || format!("file {id}"))?;
        self.get_file(id).await
    }

    /// Delete the record, then its blob.
    ///
    /// A blob that is already gone only produces a warning. A blob that
    /// cannot be removed yields `Storage`; the record stays deleted.
    pub async fn delete_file(&self, id: i32) -> Result<FileRecord> {
        let record = self.get_file(id).await?;
        let result = files::Entity::delete_by_id(id).exec(&self.db).await?;
        expect_single_row(result.rows_affected, || format!("file {id}"))?;

        match self.blobs.delete(&record.sha256).await {
            Ok(true) => {}
            Ok(false) => warn!(
                file_id = id,
                sha256 = %record.sha256,
                "Blob was already missing when its file was deleted"
            ),
            Err(e) => {
                return Err(RepoError::Storage(format!(
                    "file {id} was deleted but blob {} could not be removed: {e}",
                    record.sha256
                )));
            }
        }
        Ok(record)
    }
}
