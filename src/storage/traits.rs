//! Storage traits and error types
//!
//! This module defines the trait interface for persisting a variant's
//! collection and resume cursor.

use crate::storage::{CrawlCollection, PersistedRun, ProgressCursor};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Collection already holds a post for each of its {targets} targets")]
    CollectionFull { targets: usize },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Saves overwrite the previous snapshot in full; nothing is appended on
/// disk.
pub trait Storage {
    /// Loads the collection and cursor left behind by an earlier run
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> StorageResult<Option<PersistedRun>>;

    /// Writes the full collection snapshot
    fn save_collection(&mut self, collection: &CrawlCollection) -> StorageResult<()>;

    /// Writes the resume cursor
    ///
    /// The collection is passed for backends that keep a denormalized copy
    /// next to the cursor.
    fn save_progress(
        &mut self,
        cursor: ProgressCursor,
        collection: &CrawlCollection,
    ) -> StorageResult<()>;

    /// Forgets the resume cursor so the next run starts fresh
    fn clear_progress(&mut self) -> StorageResult<()>;
}
