//! Browser session abstraction
//!
//! The crawler only ever talks to a site through [`BrowserSession`]: load a
//! page, query elements by CSS selector, poke at them, and wait for them to
//! show up. [`HttpSession`] implements it over plain HTTP with `reqwest`
//! for fetching and `scraper` for DOM queries.

mod http;

pub use http::{build_http_client, HttpSession};

use crate::{CrawlError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Snapshot of one DOM element
///
/// `href` and `src` attributes are reported resolved against the page URL,
/// the way a browser exposes them as DOM properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Visible text with whitespace runs collapsed
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl Element {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn href(&self) -> Option<&str> {
        self.attr("href")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }
}

/// An exclusively-owned page driver
///
/// All calls operate on the page most recently loaded by `navigate`.
/// Implementations must tolerate `close` being called once on every exit
/// path, including after a failed navigation.
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads `url`, replacing the current page
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Reloads the current page
    async fn reload(&mut self) -> Result<()>;

    /// URL of the current page after redirects
    fn current_url(&self) -> Option<&str>;

    /// All elements matching `selector`, in document order
    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>>;

    /// Clicks the first element matching `selector`
    async fn activate(&mut self, selector: &str) -> Result<()>;

    /// Scrolls the first element matching `selector` into view
    async fn scroll_into_view(&mut self, selector: &str) -> Result<()>;

    /// Releases the session
    async fn close(&mut self) -> Result<()>;

    /// First element matching `selector`, if any
    async fn find_first(&mut self, selector: &str) -> Result<Option<Element>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// First element matching `selector`, or `ElementNotFound`
    async fn find(&mut self, selector: &str) -> Result<Element> {
        match self.find_first(selector).await? {
            Some(element) => Ok(element),
            None => Err(self.not_found(selector)),
        }
    }

    /// Waits until at least one element matches `selector`
    ///
    /// Re-checks every `poll` by reloading the page, and fails with
    /// `ElementNotFound` once `timeout` has elapsed.
    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<Vec<Element>> {
        let deadline = Instant::now() + timeout;
        loop {
            let elements = self.find_all(selector).await?;
            if !elements.is_empty() {
                return Ok(elements);
            }

            if Instant::now() + poll > deadline {
                tracing::debug!("Gave up waiting for '{}' after {:?}", selector, timeout);
                return Err(self.not_found(selector));
            }

            tokio::time::sleep(poll).await;
            self.reload().await?;
        }
    }

    /// Builds the `ElementNotFound` error for the current page
    fn not_found(&self, selector: &str) -> CrawlError {
        CrawlError::ElementNotFound {
            selector: selector.to_string(),
            url: self.current_url().unwrap_or("about:blank").to_string(),
        }
    }
}
