//! Resume cursor for the extraction loop

use crate::storage::collection::{CollectionDocument, CrawlCollection};
use serde::{Deserialize, Serialize};

/// Index of the first target not yet represented in `posts`
///
/// A value of N means targets `0..N`, in collection order, already have
/// their post and are skipped on restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCursor {
    #[serde(rename = "lastCompletedIndex")]
    pub last_completed_index: usize,
}

impl ProgressCursor {
    pub fn new(last_completed_index: usize) -> Self {
        Self {
            last_completed_index,
        }
    }

    /// Returns the cursor one target further on
    pub fn advanced(self) -> Self {
        Self::new(self.last_completed_index + 1)
    }
}

/// Progress file contents as written
#[derive(Debug, Serialize)]
pub(crate) struct ProgressSnapshot<'a> {
    #[serde(flatten)]
    pub cursor: ProgressCursor,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<&'a CrawlCollection>,
}

/// Progress file contents as read back
#[derive(Debug, Deserialize)]
pub(crate) struct ProgressDocument {
    #[serde(flatten)]
    pub cursor: ProgressCursor,

    #[serde(default)]
    pub collection: Option<CollectionDocument>,
}

/// A collection and cursor recovered from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRun {
    pub collection: CrawlCollection,
    pub cursor: ProgressCursor,
}

impl PersistedRun {
    /// Brings the cursor in line with the posts actually saved
    ///
    /// The collection snapshot is written before the cursor, so a crash in
    /// between leaves `posts` one ahead. `posts` is authoritative either way.
    pub fn reconciled(mut self) -> Self {
        let saved = self.collection.post_count();
        if self.cursor.last_completed_index != saved {
            tracing::warn!(
                "Progress cursor {} disagrees with {} saved posts, using {}",
                self.cursor.last_completed_index,
                saved,
                saved
            );
            self.cursor = ProgressCursor::new(saved);
        }
        self
    }

    /// Returns true if extraction still has targets left to visit
    pub fn is_resumable(&self) -> bool {
        self.cursor.last_completed_index < self.collection.target_count()
    }
}
