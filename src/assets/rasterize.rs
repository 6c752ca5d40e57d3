//! PDF page rasterization
//!
//! Every page of every PDF becomes `<out>/<stem>/<stem>_page_<n>.png`, and
//! `metadata.json` maps each PDF to its page images for the viewer.

use crate::assets::{list_files, AssetError, AssetResult};
use crate::config::AssetsConfig;
use crate::storage::write_json;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the page manifest inside the page images directory
pub const PAGE_MANIFEST: &str = "metadata.json";

/// One entry of `metadata.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfPages {
    /// PDF file name, extension included
    pub file: String,
    /// Public URLs of the page images, in page order
    pub images: Vec<String>,
}

/// Renders PDF pages to PNG files
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Renders every page of `pdf` into `out_dir`
    ///
    /// Returns the written files in page order, each named
    /// `<stem>_page_<n>.png` with `n` starting at 1.
    async fn render_pages(
        &self,
        pdf: &Path,
        out_dir: &Path,
        stem: &str,
        dpi: u32,
    ) -> AssetResult<Vec<PathBuf>>;
}

/// Rasterizer backed by poppler's `pdftoppm`
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn render_pages(
        &self,
        pdf: &Path,
        out_dir: &Path,
        stem: &str,
        dpi: u32,
    ) -> AssetResult<Vec<PathBuf>> {
        let raw_prefix = out_dir.join(format!("{}_page", stem));
        let rasterize_error = |message: String| AssetError::Rasterize {
            file: pdf.to_path_buf(),
            message,
        };

        let output = tokio::process::Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(pdf)
            .arg(&raw_prefix)
            .output()
            .await
            .map_err(|e| {
                rasterize_error(format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(rasterize_error(stderr.trim().to_string()));
        }

        rename_pdftoppm_output(out_dir, stem)
    }
}

/// Renames `<stem>_page-01.png` style output to `<stem>_page_1.png`
///
/// pdftoppm zero-pads page numbers to the width of the last page number.
fn rename_pdftoppm_output(out_dir: &Path, stem: &str) -> AssetResult<Vec<PathBuf>> {
    let raw_prefix = format!("{}_page-", stem);
    let mut pages = Vec::new();

    for path in list_files(out_dir, &["png"])? {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(page) = name
            .strip_prefix(&raw_prefix)
            .and_then(|n| n.parse::<usize>().ok())
        else {
            continue;
        };
        pages.push((page, path));
    }
    pages.sort_by_key(|(page, _)| *page);

    let mut renamed = Vec::with_capacity(pages.len());
    for (page, path) in pages {
        let target = out_dir.join(page_file_name(stem, page));
        fs::rename(&path, &target).map_err(AssetError::io(&path))?;
        renamed.push(target);
    }
    Ok(renamed)
}

fn page_file_name(stem: &str, page: usize) -> String {
    format!("{}_page_{}.png", stem, page)
}

/// Rasterizes every PDF and writes `metadata.json`
///
/// PDFs are processed in name order. A PDF that fails to render aborts the
/// pass; the manifest is only written once every PDF is done.
pub async fn create_page_images<R>(
    config: &AssetsConfig,
    rasterizer: &R,
) -> AssetResult<Vec<PdfPages>>
where
    R: PageRasterizer + ?Sized,
{
    let out_root = &config.pdf_images_dir;
    fs::create_dir_all(out_root).map_err(AssetError::io(out_root))?;

    let prefix = config.pdf_image_url_prefix.trim_end_matches('/');
    let mut metadata = Vec::new();

    for pdf in list_files(&config.pdfs_dir, &["pdf"])? {
        let file = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let out_dir = out_root.join(&stem);
        fs::create_dir_all(&out_dir).map_err(AssetError::io(&out_dir))?;

        let pages = rasterizer
            .render_pages(&pdf, &out_dir, &stem, config.dpi)
            .await?;
        tracing::debug!("{} rendered to {} pages", file, pages.len());

        let images = pages
            .iter()
            .filter_map(|page| page.file_name())
            .map(|name| format!("{}/{}/{}", prefix, stem, name.to_string_lossy()))
            .collect();
        metadata.push(PdfPages { file, images });
    }

    write_json(&out_root.join(PAGE_MANIFEST), &metadata)?;
    tracing::info!(
        "Rendered {} PDF files and created {}",
        metadata.len(),
        PAGE_MANIFEST
    );

    Ok(metadata)
}
