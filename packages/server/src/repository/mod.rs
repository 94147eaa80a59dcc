//! Transactional metadata access.
//!
//! The repository owns every relational row. It also owns removing a blob
//! once the last row referencing it is gone, so it holds a handle to the
//! blob store next to the database connection. Callers are expected to hold
//! the matching [`crate::serializer::WriteSerializer`] lock around every
//! mutation; the repository itself never locks.

mod documents;
mod entities;
mod files;

use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::error::{RepoError, Result};

#[derive(Clone)]
pub struct MetadataRepository {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
}

impl MetadataRepository {
    pub fn new(db: DatabaseConnection, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RepoError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// An update or delete keyed by primary key must touch exactly one row.
fn expect_single_row(rows_affected: u64, what: impl FnOnce() -> String) -> Result<()> {
    if rows_affected != 1 {
        return Err(RepoError::NotFound(what()));
    }
    Ok(())
}
