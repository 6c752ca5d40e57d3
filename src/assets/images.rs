//! Agency icon renumbering

use crate::assets::{dedup_and_renumber, AssetResult};
use crate::config::AssetsConfig;
use crate::storage::{read_json, write_json, CollectionDocument};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the image manifest inside the images directory
pub const IMAGE_MANIFEST: &str = "imageUrls.json";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Contents of `imageUrls.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageManifest {
    #[serde(rename = "imageUrls")]
    pub image_urls: Vec<String>,
}

/// Deduplicates and renumbers the images, then writes the manifest
///
/// The manifest lists the renumbered local images first, followed by every
/// `imgSrc` found in the given collection files. A collection file that
/// does not exist yet contributes nothing.
///
/// # Arguments
///
/// * `config` - Asset locations and URL prefixes
/// * `collections` - Collection JSON files whose hero images are appended
pub fn rename_images_and_write_manifest(
    config: &AssetsConfig,
    collections: &[&Path],
) -> AssetResult<ImageManifest> {
    let report = dedup_and_renumber(
        &config.images_dir,
        IMAGE_EXTENSIONS,
        &config.image_url_prefix,
    )?;
    let renamed = report.urls.len();

    let mut manifest = ImageManifest {
        image_urls: report.urls,
    };

    for path in collections {
        match read_json::<CollectionDocument>(path)? {
            Some(document) => manifest.image_urls.extend(
                document
                    .posts
                    .into_iter()
                    .filter_map(|post| post.image_src)
                    .filter(|src| !src.is_empty()),
            ),
            None => tracing::warn!("{} not found, no hero images added", path.display()),
        }
    }

    write_json(&config.images_dir.join(IMAGE_MANIFEST), &manifest)?;

    tracing::info!(
        "Renamed {} image files, deleted {} duplicates, and created {}",
        renamed,
        report.duplicates_removed,
        IMAGE_MANIFEST
    );

    Ok(manifest)
}
