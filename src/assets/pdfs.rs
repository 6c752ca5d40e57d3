//! PDF renumbering

use crate::assets::{dedup_and_renumber, AssetResult};
use crate::config::AssetsConfig;
use crate::storage::write_json;
use serde::{Deserialize, Serialize};

/// File name of the PDF manifest inside the PDF directory
pub const PDF_MANIFEST: &str = "pdfUrls.json";

/// Contents of `pdfUrls.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfManifest {
    #[serde(rename = "pdfUrls")]
    pub pdf_urls: Vec<String>,
}

/// Deduplicates and renumbers the PDFs, then writes the manifest
pub fn rename_pdfs_and_write_manifest(config: &AssetsConfig) -> AssetResult<PdfManifest> {
    let report = dedup_and_renumber(&config.pdfs_dir, &["pdf"], &config.pdf_url_prefix)?;
    let manifest = PdfManifest {
        pdf_urls: report.urls,
    };

    write_json(&config.pdfs_dir.join(PDF_MANIFEST), &manifest)?;

    tracing::info!(
        "Renamed {} PDF files, deleted {} duplicates, and created {}",
        manifest.pdf_urls.len(),
        report.duplicates_removed,
        PDF_MANIFEST
    );

    Ok(manifest)
}
