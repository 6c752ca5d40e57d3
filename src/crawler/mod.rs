//! Crawler module for walking the job board
//!
//! This module contains the core crawling logic, including:
//! - The per-variant state machine (`Crawler`)
//! - Post content extraction
//! - The CSS selectors both rely on

mod coordinator;
mod extractor;

pub use coordinator::{CrawlOutcome, Crawler, StartMode};
pub use extractor::{extract_post, ExtractionSettings};

use crate::browser::HttpSession;
use crate::config::{Config, VariantConfig};
use crate::storage::JsonStorage;
use crate::Result;

/// CSS selectors for the job board's markup
pub(crate) mod selectors {
    /// Navigation menu toggle
    pub const MENU: &str = "*[aria-label='Menu']";
    pub const MENU_OPTIONS: &str = "ul li.wsite-menu-item-wrap a.wsite-menu-item";

    /// One dated entry on the updates index
    pub const INDEX_ENTRY: &str = ".blog-title-link";
    /// Links inside the posts of a listing page
    pub const LISTING_LINKS: &str = "[id^='blog-post-'] a";

    pub const POST_CONTAINER: &str = ".blog-post";
    pub const POST_TITLE_LINK: &str = ".blog-title-link.blog-link";
    pub const POST_DATE: &str = ".blog-date > .date-text";
    pub const HERO_IMAGE: &str = "*[alt='Picture']";
    pub const POST_PARAGRAPHS: &str = ".blog-content > .paragraph";
    pub const IFRAME: &str = "iframe";

    /// Substring identifying the embedded document viewer
    pub const EMBEDDED_VIEWER_HOST: &str = "drive.google";
}

/// Runs one variant's crawl over HTTP with JSON file persistence
///
/// This is the main entry point for crawling. It will:
/// 1. Open an HTTP browser session
/// 2. Open the variant's JSON storage
/// 3. Resume the persisted run, or navigate from the home page
/// 4. Close the session before returning
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `variant` - Which configured variant to crawl
/// * `mode` - Whether earlier progress is resumed or discarded
pub async fn crawl_variant(
    config: &Config,
    variant: &VariantConfig,
    mode: StartMode,
) -> Result<CrawlOutcome> {
    let session = HttpSession::new(&config.browser)?;
    let storage = JsonStorage::for_variant(variant);

    let mut crawler = Crawler::new(config, variant, session, storage);
    crawler.run(mode).await
}
