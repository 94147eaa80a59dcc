use std::sync::Arc;

use common::storage::{BlobStore, BoxReader, ContentHash};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{ErrorKind, Result};
use crate::ingest::{IngestSource, RemoteFetcher};
use crate::models::document::{
    JsonDocument, NewTypedDocument, TypedDocumentSummary, TypedJsonDocument,
};
use crate::models::entity::{EntityInput, EntityRecord};
use crate::models::file::{FileRecord, FileUpdate, NewFile};
use crate::repository::MetadataRepository;
use crate::serializer::{ResourceKind, WriteSerializer};

/// A new file as requested by a caller.
#[derive(Debug)]
pub struct FileUpload {
    /// Display name; derived from the source when absent.
    pub name: Option<String>,
    pub source: IngestSource,
}

/// Write orchestration over the blob store and the metadata repository.
///
/// Every mutation holds its resource kind's lock from before the first blob
/// or row is touched until the last cleanup step has finished. Reads go
/// straight to the repository.
#[derive(Clone)]
pub struct DocumentService {
    repo: MetadataRepository,
    blobs: Arc<dyn BlobStore>,
    serializer: Arc<WriteSerializer>,
    fetcher: RemoteFetcher,
}

impl DocumentService {
    pub fn new(
        db: DatabaseConnection,
        blobs: Arc<dyn BlobStore>,
        serializer: Arc<WriteSerializer>,
        fetcher: RemoteFetcher,
    ) -> Self {
        Self {
            repo: MetadataRepository::new(db, blobs.clone()),
            blobs,
            serializer,
            fetcher,
        }
    }

    /// Ingest the source's bytes and record them as a new file.
    ///
    /// The digest is only known once the bytes have been read, so the
    /// duplicate check runs after ingest. Content that was already stored is
    /// left untouched; a blob created by this call is removed again if the
    /// record cannot be inserted.
    #[instrument(skip(self, upload), fields(origin))]
    pub async fn create_file(&self, upload: FileUpload) -> Result<FileRecord> {
        let origin = upload.source.origin();
        tracing::Span::current().record("origin", origin.as_str());

        let _guard = self.serializer.lock(ResourceKind::Files).await;

        let default_name = upload.source.default_display_name();
        let reader = match upload.source {
            IngestSource::Remote(url) => self.fetcher.fetch(&url).await?,
            IngestSource::Inline(inline) => inline.reader,
        };
        let ingested = self.blobs.put_stream(reader).await?;

        let name = upload
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .or(default_name)
            .unwrap_or_else(|| ingested.hash.to_hex());

        let new_file = NewFile {
            name,
            path: origin,
            size: ingested.size as i64,
            sha256: ingested.hash,
        };

        match self.repo.create_file(new_file).await {
            Ok(record) => {
                info!(file_id = record.id, sha256 = %record.sha256, size = record.size, "Created file");
                Ok(record)
            }
            Err(e) => {
                if ingested.created && e.kind() != ErrorKind::Conflict {
                    self.discard_blob(&ingested.hash).await;
                }
                Err(e)
            }
        }
    }

    async fn discard_blob(&self, hash: &ContentHash) {
        match self.blobs.delete(hash).await {
            Ok(_) => warn!(sha256 = %hash, "Removed blob left without a file record"),
            Err(e) => warn!(sha256 = %hash, error = %e, "Failed to remove orphaned blob"),
        }
    }

    pub async fn get_file(&self, id: i32) -> Result<FileRecord> {
        self.repo.get_file(id).await
    }

    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        self.repo.list_files().await
    }

    /// The file's record together with a reader over its bytes.
    pub async fn open_file(&self, id: i32) -> Result<(FileRecord, BoxReader)> {
        let record = self.repo.get_file(id).await?;
        let reader = self.open_blob(&record).await?;
        Ok((record, reader))
    }

    pub async fn open_file_by_name(&self, name: &str) -> Result<(FileRecord, BoxReader)> {
        let record = self.repo.get_file_by_name(name).await?;
        let reader = self.open_blob(&record).await?;
        Ok((record, reader))
    }

    async fn open_blob(&self, record: &FileRecord) -> Result<BoxReader> {
        Ok(self.blobs.get_stream(&record.sha256).await?)
    }

    #[instrument(skip(self, update))]
    pub async fn update_file(&self, id: i32, update: FileUpdate) -> Result<FileRecord> {
        let _guard = self.serializer.lock(ResourceKind::Files).await;
        let record = self.repo.update_file(id, update).await?;
        info!(file_id = id, "Updated file");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, id: i32) -> Result<FileRecord> {
        let _guard = self.serializer.lock(ResourceKind::Files).await;
        let record = self.repo.delete_file(id).await?;
        info!(file_id = id, sha256 = %record.sha256, "Deleted file");
        Ok(record)
    }

    #[instrument(skip(self, input), fields(entity_id = %input.id))]
    pub async fn create_entity(&self, input: EntityInput) -> Result<EntityRecord> {
        let _guard = self.serializer.lock(ResourceKind::Entities).await;
        let record = self.repo.create_entity(input).await?;
        info!(entity_id = %record.id, "Created entity");
        Ok(record)
    }

    #[instrument(skip(self, input))]
    pub async fn update_entity(&self, id: &str, input: EntityInput) -> Result<EntityRecord> {
        let _guard = self.serializer.lock(ResourceKind::Entities).await;
        let record = self.repo.update_entity(id, input).await?;
        info!(entity_id = %id, "Updated entity");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete_entity(&self, id: &str) -> Result<EntityRecord> {
        let _guard = self.serializer.lock(ResourceKind::Entities).await;
        let record = self.repo.delete_entity(id).await?;
        info!(entity_id = %id, "Deleted entity");
        Ok(record)
    }

    pub async fn get_entity(&self, id: &str) -> Result<EntityRecord> {
        self.repo.get_entity(id).await
    }

    pub async fn list_entities(&self) -> Result<Vec<EntityRecord>> {
        self.repo.list_entities().await
    }

    #[instrument(skip(self, data))]
    pub async fn create_document(&self, key: &str, data: Value) -> Result<JsonDocument> {
        let _guard = self.serializer.lock(ResourceKind::JsonData).await;
        let document = self.repo.create_document(key, data).await?;
        info!(key = %key, "Created document");
        Ok(document)
    }

    pub async fn get_document(&self, key: &str) -> Result<JsonDocument> {
        self.repo.get_document(key).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_document(&self, key: &str, data: Value) -> Result<JsonDocument> {
        let _guard = self.serializer.lock(ResourceKind::JsonData).await;
        let document = self.repo.update_document(key, data).await?;
        info!(key = %key, "Updated document");
        Ok(document)
    }

    #[instrument(skip(self))]
    pub async fn delete_document(&self, key: &str) -> Result<JsonDocument> {
        let _guard = self.serializer.lock(ResourceKind::JsonData).await;
        let document = self.repo.delete_document(key).await?;
        info!(key = %key, "Deleted document");
        Ok(document)
    }

    #[instrument(skip(self, new), fields(key = %new.key, doc_type = %new.doc_type))]
    pub async fn create_typed_document(&self, new: NewTypedDocument) -> Result<TypedJsonDocument> {
        let _guard = self.serializer.lock(ResourceKind::TypedJsonData).await;
        let document = self.repo.create_typed_document(new).await?;
        info!(key = %document.key, "Created typed document");
        Ok(document)
    }

    pub async fn get_typed_document(&self, key: &str) -> Result<TypedJsonDocument> {
        self.repo.get_typed_document(key).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_typed_document(&self, key: &str, data: Value) -> Result<TypedJsonDocument> {
        let _guard = self.serializer.lock(ResourceKind::TypedJsonData).await;
        let document = self.repo.update_typed_document(key, data).await?;
        info!(key = %key, "Updated typed document");
        Ok(document)
    }

    #[instrument(skip(self))]
    pub async fn delete_typed_document(&self, key: &str) -> Result<TypedJsonDocument> {
        let _guard = self.serializer.lock(ResourceKind::TypedJsonData).await;
        let document = self.repo.delete_typed_document(key).await?;
        info!(key = %key, "Deleted typed document");
        Ok(document)
    }

    pub async fn list_typed_documents(
        &self,
        type_filter: Option<&str>,
    ) -> Result<Vec<TypedDocumentSummary>> {
        self.repo.list_typed_documents(type_filter).await
    }
}
