//! Vacancy crawler: a resumable job-board scraper
//!
//! This crate crawls the public and private sector listings of a government
//! jobs board, extracts each day's vacancy posts and persists them as JSON,
//! together with the asset utilities that renumber downloaded images and PDFs.

pub mod assets;
pub mod browser;
pub mod config;
pub mod crawler;
pub mod links;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element '{selector}' not found on {url}")]
    ElementNotFound { selector: String, url: String },

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Interaction with '{selector}' failed: {message}")]
    Interaction { selector: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid crawl transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("No page loaded in the browser session")]
    NoPageLoaded,
}

impl CrawlError {
    /// Returns true for errors the state machine logs and steps past
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Interaction { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, SiteVariant};
pub use crawler::{CrawlOutcome, Crawler, StartMode};
pub use links::{LinkClass, LinkClassifier, TodayPattern};
pub use state::CrawlState;
pub use storage::{CrawlCollection, JsonStorage, NavigationTarget, PostRecord, ProgressCursor};
