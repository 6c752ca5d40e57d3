use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the vacancy crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(rename = "variant", default)]
    pub variants: Vec<VariantConfig>,
    #[serde(default)]
    pub assets: AssetsConfig,
}

impl Config {
    /// Looks up a configured variant by its name
    pub fn variant(&self, name: &str) -> Option<&VariantConfig> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// The job board being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Every followed link must start with this origin
    pub origin: String,

    /// Site root loaded first
    #[serde(rename = "home-url")]
    pub home_url: String,

    /// Fallback "latest updates" page used when no menu option matches
    #[serde(rename = "updates-url")]
    pub updates_url: String,

    /// Case-insensitive substring identifying the updates menu option
    #[serde(rename = "menu-keyword")]
    pub menu_keyword: String,
}

/// Browser session timing and identity
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound for a single page load (seconds)
    #[serde(rename = "navigation-timeout-secs", default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Upper bound for waiting on a selector to appear (seconds)
    #[serde(rename = "wait-timeout-secs", default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Delay between checks while waiting on a selector (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Fixed pause between loading an index page and reading its links (seconds)
    #[serde(rename = "settle-delay-secs", default = "default_settle_delay")]
    pub settle_delay_secs: u64,
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            navigation_timeout_secs: default_navigation_timeout(),
            wait_timeout_secs: default_wait_timeout(),
            poll_interval_ms: default_poll_interval(),
            settle_delay_secs: default_settle_delay(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0".to_string()
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_wait_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    500
}

fn default_settle_delay() -> u64 {
    10
}

/// Which listing of the site a crawl targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteVariant {
    /// Government departments, listed directly on today's updates page
    Public,
    /// Private businesses, one sector-switch link away from today's updates page
    Private,
}

impl SiteVariant {
    /// JSON key holding the discovered targets in the output file
    pub fn targets_key(&self) -> &'static str {
        match self {
            Self::Public => "departments",
            Self::Private => "businesses",
        }
    }

    /// Prefix prepended to every generated post uuid
    pub fn uuid_prefix(&self) -> &'static str {
        match self {
            Self::Public => "p",
            Self::Private => "gov-",
        }
    }

    /// Whether the progress file carries a copy of the collection by default
    pub fn embeds_collection_by_default(&self) -> bool {
        matches!(self, Self::Private)
    }
}

impl fmt::Display for SiteVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// One independent crawl of the site
#[derive(Debug, Clone, Deserialize)]
pub struct VariantConfig {
    pub kind: SiteVariant,

    /// Collection title, also used in log lines
    pub name: String,

    /// JSON file holding the collection, rewritten after each post
    #[serde(rename = "output-path")]
    pub output_path: PathBuf,

    /// JSON file holding the resume cursor
    #[serde(rename = "progress-path")]
    pub progress_path: PathBuf,

    /// Store a denormalized collection copy inside the progress file
    #[serde(rename = "embed-collection", default)]
    pub embed_collection: Option<bool>,
}

impl VariantConfig {
    pub fn embeds_collection(&self) -> bool {
        self.embed_collection
            .unwrap_or_else(|| self.kind.embeds_collection_by_default())
    }
}

/// Locations and URL prefixes for the asset utilities
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    #[serde(rename = "images-dir", default = "default_images_dir")]
    pub images_dir: PathBuf,

    #[serde(rename = "image-url-prefix", default = "default_image_url_prefix")]
    pub image_url_prefix: String,

    #[serde(rename = "pdfs-dir", default = "default_pdfs_dir")]
    pub pdfs_dir: PathBuf,

    #[serde(rename = "pdf-url-prefix", default = "default_pdf_url_prefix")]
    pub pdf_url_prefix: String,

    #[serde(rename = "pdf-images-dir", default = "default_pdf_images_dir")]
    pub pdf_images_dir: PathBuf,

    #[serde(rename = "pdf-image-url-prefix", default = "default_pdf_image_url_prefix")]
    pub pdf_image_url_prefix: String,

    /// Rasterization resolution in dots per inch
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            image_url_prefix: default_image_url_prefix(),
            pdfs_dir: default_pdfs_dir(),
            pdf_url_prefix: default_pdf_url_prefix(),
            pdf_images_dir: default_pdf_images_dir(),
            pdf_image_url_prefix: default_pdf_image_url_prefix(),
            dpi: default_dpi(),
        }
    }
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("./database/agency_icons")
}

fn default_image_url_prefix() -> String {
    "/assets/agency_icons".to_string()
}

fn default_pdfs_dir() -> PathBuf {
    PathBuf::from("./database/pdfs")
}

fn default_pdf_url_prefix() -> String {
    "/assets/pdfs".to_string()
}

fn default_pdf_images_dir() -> PathBuf {
    PathBuf::from("./database/pdf_images")
}

fn default_pdf_image_url_prefix() -> String {
    "./assets/pdf_images".to_string()
}

fn default_dpi() -> u32 {
    72
}
