//! Storage module for persisting crawl data
//!
//! This module handles everything a variant's run keeps between restarts:
//! - The in-memory record store (`CrawlCollection`)
//! - The resume cursor (`ProgressCursor`)
//! - JSON file persistence behind the `Storage` trait

mod collection;
mod json;
mod progress;
mod traits;

pub use collection::{CollectionDocument, CrawlCollection, NavigationTarget, PostRecord};
pub use json::JsonStorage;
pub use progress::{PersistedRun, ProgressCursor};
pub use traits::{Storage, StorageError, StorageResult};

pub(crate) use json::{read_json, write_json};
