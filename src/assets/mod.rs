//! Asset utilities for downloaded media
//!
//! Runs after both collections are final:
//! - Image deduplication, renumbering and the `imageUrls.json` manifest
//! - PDF deduplication, renumbering and the `pdfUrls.json` manifest
//! - PDF page rasterization and the `metadata.json` manifest

mod images;
mod pdfs;
mod rasterize;

pub use images::{rename_images_and_write_manifest, ImageManifest, IMAGE_MANIFEST};
pub use pdfs::{rename_pdfs_and_write_manifest, PdfManifest, PDF_MANIFEST};
pub use rasterize::{
    create_page_images, PageRasterizer, PdfPages, PdftoppmRasterizer, PAGE_MANIFEST,
};

use crate::storage::StorageError;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the asset utilities
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Manifest error: {0}")]
    Manifest(#[from] StorageError),

    #[error("Failed to rasterize {}: {message}", file.display())]
    Rasterize { file: PathBuf, message: String },
}

impl AssetError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// What a dedup-and-renumber pass did to a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenumberReport {
    /// Public URLs of the renumbered files, in new-name order
    pub urls: Vec<String>,
    pub duplicates_removed: usize,
}

/// Lists regular files whose extension is in `extensions`, sorted by name
///
/// Extensions are compared case-insensitively and given without the dot.
pub(crate) fn list_files(dir: &Path, extensions: &[&str]) -> AssetResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(AssetError::io(dir))? {
        let path = entry.map_err(AssetError::io(dir))?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
        .unwrap_or(false)
}

/// Computes the SHA-256 of a file's content as lowercase hex
pub(crate) fn hash_file(path: &Path) -> AssetResult<String> {
    let bytes = fs::read(path).map_err(AssetError::io(path))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Deletes content duplicates and renames the rest to `1.ext, 2.ext, ...`
///
/// Files are visited in name order, so the first of a duplicate group by
/// name survives. Survivors go through unique temporary names first, which
/// keeps a file already called `2.png` from being overwritten.
pub(crate) fn dedup_and_renumber(
    dir: &Path,
    extensions: &[&str],
    url_prefix: &str,
) -> AssetResult<RenumberReport> {
    let mut seen = HashSet::new();
    let mut report = RenumberReport::default();
    let mut staged = Vec::new();

    for path in list_files(dir, extensions)? {
        if !seen.insert(hash_file(&path)?) {
            fs::remove_file(&path).map_err(AssetError::io(&path))?;
            report.duplicates_removed += 1;
            continue;
        }

        let ext = extension_of(&path);
        let temp = dir.join(format!("{}.{}", Uuid::new_v4(), ext));
        fs::rename(&path, &temp).map_err(AssetError::io(&path))?;
        staged.push((temp, ext));
    }

    let prefix = url_prefix.trim_end_matches('/');
    for (count, (temp, ext)) in staged.into_iter().enumerate() {
        let name = format!("{}.{}", count + 1, ext);
        let target = dir.join(&name);
        fs::rename(&temp, &target).map_err(AssetError::io(&temp))?;
        report.urls.push(format!("{}/{}", prefix, name));
    }

    Ok(report)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}
