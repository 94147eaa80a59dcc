use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use super::error::StorageError;
use super::hash::{ContentHash, StreamDigest};
use super::traits::{BlobStore, BoxReader, IngestedBlob};

const TEMP_DIR: &str = ".tmp";
const READ_BUF_SIZE: usize = 64 * 1024;

/// Filesystem-backed content-addressed blob store.
///
/// Blobs live directly under the base directory, one file per digest:
/// `{base_path}/{64 hex chars}`. Writes are staged in `{base_path}/.tmp`
/// so the final rename never crosses a volume boundary.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating its directories.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(TEMP_DIR)).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Compute the filesystem path for a given content hash.
    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.base_path.join(hash.to_hex())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Copy `reader` into `temp_path`, returning the digest and byte count.
    async fn stage(
        &self,
        reader: &mut BoxReader,
        temp_path: &Path,
    ) -> Result<(ContentHash, u64), StorageError> {
        let mut digest = StreamDigest::new();
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut temp_file = fs::File::create(temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            digest.update(&buf[..n]);
            if digest.len() > self.max_size {
                return Err(StorageError::TooLarge {
                    read: digest.len(),
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;

        Ok(digest.finish())
    }
}

/// Remove a staging file that will not be promoted.
async fn discard_staged(temp_path: &Path) -> bool {
    match fs::remove_file(temp_path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %temp_path.display(), error = %e, "Orphaned staging file");
            false
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(&self, mut reader: BoxReader) -> Result<IngestedBlob, StorageError> {
        let temp_path = self.temp_path();

        let (hash, size) = match self.stage(&mut reader, &temp_path).await {
            Ok(staged) => staged,
            Err(e) => {
                discard_staged(&temp_path).await;
                return Err(e);
            }
        };

        let blob_path = self.blob_path(&hash);

        let already_stored = match fs::try_exists(&blob_path).await {
            Ok(exists) => exists,
            Err(e) => {
                discard_staged(&temp_path).await;
                return Err(e.into());
            }
        };

        if already_stored {
            discard_staged(&temp_path).await;
            debug!(%hash, size, "Blob already stored");
            return Ok(IngestedBlob {
                hash,
                size,
                created: false,
            });
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            discard_staged(&temp_path).await;
            return Err(e.into());
        }

        debug!(%hash, size, "Blob stored");
        Ok(IngestedBlob {
            hash,
            size,
            created: true,
        })
    }

    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(hash);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::Missing(*hash))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(hash);
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(hash);
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError> {
        let blob_path = self.blob_path(hash);
        match fs::metadata(&blob_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::Missing(*hash))
            }
            Err(e) => Err(e.into()),
        }
    }
}
