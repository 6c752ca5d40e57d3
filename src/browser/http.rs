//! HTTP-backed browser session
//!
//! Pages are fetched with `reqwest` and queried with `scraper`. No script
//! runs, so activating or scrolling an element only checks that it exists;
//! the job board renders its menu and post lists server-side.

use crate::browser::{BrowserSession, Element};
use crate::config::BrowserConfig;
use crate::{CrawlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client used by [`HttpSession`]
///
/// # Example
///
/// ```no_run
/// use vacancy_crawler::browser::build_http_client;
/// use vacancy_crawler::config::BrowserConfig;
///
/// let client = build_http_client(&BrowserConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &BrowserConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.navigation_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Debug)]
struct LoadedPage {
    url: Url,
    body: String,
}

/// Browser session over plain HTTP
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    page: Option<LoadedPage>,
    closed: bool,
}

impl HttpSession {
    /// Creates a session with a client configured from `config`
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            page: None,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn loaded(&self) -> Result<&LoadedPage> {
        self.page.as_ref().ok_or(CrawlError::NoPageLoaded)
    }

    async fn fetch(&self, url: &str) -> Result<LoadedPage> {
        let navigation_error = |message: String| CrawlError::Navigation {
            url: url.to_string(),
            message,
        };

        if self.closed {
            return Err(navigation_error("session is closed".to_string()));
        }

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                navigation_error("request timeout".to_string())
            } else if e.is_connect() {
                navigation_error("connection refused".to_string())
            } else {
                navigation_error(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        Ok(LoadedPage {
            url: final_url,
            body,
        })
    }

    /// Fails with `Interaction` unless `selector` matches something
    fn require_present(&self, selector: &str, action: &str) -> Result<()> {
        let page = self.loaded()?;
        if select_elements(&page.body, &page.url, selector)?.is_empty() {
            return Err(CrawlError::Interaction {
                selector: selector.to_string(),
                message: format!("no element to {}", action),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        let page = self.fetch(url).await?;
        self.page = Some(page);
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        let url = self.loaded()?.url.to_string();
        self.navigate(&url).await
    }

    fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.url.as_str())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>> {
        let page = self.loaded()?;
        select_elements(&page.body, &page.url, selector)
    }

    async fn activate(&mut self, selector: &str) -> Result<()> {
        self.require_present(selector, "activate")
    }

    async fn scroll_into_view(&mut self, selector: &str) -> Result<()> {
        self.require_present(selector, "scroll to")
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            tracing::debug!("Closing browser session");
        }
        self.closed = true;
        self.page = None;
        Ok(())
    }
}

/// Runs a CSS selector over an HTML document
///
/// Kept synchronous: a parsed `Html` never lives across an await point.
fn select_elements(html: &str, base_url: &Url, selector: &str) -> Result<Vec<Element>> {
    let parsed = Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })?;

    let document = Html::parse_document(html);
    let elements = document
        .select(&parsed)
        .map(|element| {
            let text = element.text().collect::<String>();
            let mut attributes = HashMap::new();
            for (name, value) in element.value().attrs() {
                let value = match name {
                    "href" | "src" => resolve(value, base_url),
                    _ => value.to_string(),
                };
                attributes.insert(name.to_string(), value);
            }
            Element {
                text: collapse_whitespace(&text),
                attributes,
            }
        })
        .collect();

    Ok(elements)
}

/// Resolves a link against the page URL, keeping unresolvable values as-is
fn resolve(value: &str, base_url: &Url) -> String {
    let value = value.trim();
    match base_url.join(value) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => value.to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
