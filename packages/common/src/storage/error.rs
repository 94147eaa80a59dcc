use thiserror::Error;

use super::hash::ContentHash;

/// Failure of a blob store operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no blob stored under {0}")]
    Missing(ContentHash),

    #[error("blob store IO failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed digest: {0}")]
    MalformedDigest(String),

    /// Ingest stopped as soon as the limit was crossed, so `read` is a lower bound.
    #[error("blob exceeds the {limit} byte limit (read {read} bytes)")]
    TooLarge { read: u64, limit: u64 },
}
