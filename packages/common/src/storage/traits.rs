use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::hash::ContentHash;

pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Outcome of a successful ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestedBlob {
    pub hash: ContentHash,
    /// Number of bytes read from the source.
    pub size: u64,
    /// `false` when a blob with the same digest was already stored.
    pub created: bool,
}

/// Content-addressed blob storage.
///
/// A blob only becomes visible under its digest once it has been written
/// completely. Ingesting content that is already stored succeeds without
/// error; rejecting duplicates is up to the metadata layer.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, data: &[u8]) -> Result<IngestedBlob, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(reader).await
    }

    /// Drain `reader` into the store, hashing it on the way in. Fails
    /// without leaving anything visible if the reader errors or the size
    /// limit is crossed.
    async fn put_stream(&self, reader: BoxReader) -> Result<IngestedBlob, StorageError>;

    /// Buffered form of [`BlobStore::get_stream`].
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(hash).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a stored blob. [`StorageError::Missing`] if nothing is stored
    /// under `hash`.
    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError>;

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// `Ok(false)` when there was nothing to remove.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError>;
}
