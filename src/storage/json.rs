//! JSON file storage implementation
//!
//! Each variant owns two files: the collection document consumed by the
//! front-end, and a progress file holding the resume cursor (optionally with
//! a copy of the collection).

use crate::config::{SiteVariant, VariantConfig};
use crate::storage::collection::{CollectionDocument, CrawlCollection};
use crate::storage::progress::{PersistedRun, ProgressCursor, ProgressDocument, ProgressSnapshot};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSON file storage backend
#[derive(Debug, Clone)]
pub struct JsonStorage {
    variant: SiteVariant,
    output_path: PathBuf,
    progress_path: PathBuf,
    embed_collection: bool,
}

impl JsonStorage {
    pub fn new(
        variant: SiteVariant,
        output_path: impl Into<PathBuf>,
        progress_path: impl Into<PathBuf>,
        embed_collection: bool,
    ) -> Self {
        Self {
            variant,
            output_path: output_path.into(),
            progress_path: progress_path.into(),
            embed_collection,
        }
    }

    /// Creates the storage described by a variant's configuration
    pub fn for_variant(config: &VariantConfig) -> Self {
        Self::new(
            config.kind,
            &config.output_path,
            &config.progress_path,
            config.embeds_collection(),
        )
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> StorageResult<Option<PersistedRun>> {
        let output: Option<CollectionDocument> = read_json(&self.output_path)?;
        let progress: Option<ProgressDocument> = read_json(&self.progress_path)?;

        let (cursor, embedded) = match progress {
            Some(doc) => (doc.cursor, doc.collection),
            None => (ProgressCursor::default(), None),
        };

        // The output file is written first on every save, so it is the
        // freshest copy when both exist
        let document = match (output, embedded) {
            (Some(document), _) => document,
            (None, Some(document)) => document,
            (None, None) => return Ok(None),
        };

        let run = PersistedRun {
            collection: CrawlCollection::from_document(self.variant, document),
            cursor,
        };
        Ok(Some(run.reconciled()))
    }

    fn save_collection(&mut self, collection: &CrawlCollection) -> StorageResult<()> {
        write_json(&self.output_path, collection)
    }

    fn save_progress(
        &mut self,
        cursor: ProgressCursor,
        collection: &CrawlCollection,
    ) -> StorageResult<()> {
        let snapshot = ProgressSnapshot {
            cursor,
            collection: self.embed_collection.then_some(collection),
        };
        write_json(&self.progress_path, &snapshot)
    }

    fn clear_progress(&mut self) -> StorageResult<()> {
        match fs::remove_file(&self.progress_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Persistence {
                path: self.progress_path.clone(),
                source,
            }),
        }
    }
}

/// Reads a JSON document, treating a missing file as `None`
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StorageError::Serialization {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes a pretty-printed JSON document, replacing any previous content
///
/// The document goes to a sibling temporary file first and is renamed into
/// place, so readers never observe a half-written file.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let persistence = |source| StorageError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persistence)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(persistence)?;
    fs::rename(&tmp, path).map_err(persistence)?;
    Ok(())
}
