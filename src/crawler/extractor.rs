//! Post content extraction
//!
//! Turns one post page into a [`PostRecord`]. The title link and posted date
//! are required; the hero image and embedded viewer are optional.

use crate::browser::BrowserSession;
use crate::crawler::selectors;
use crate::storage::PostRecord;
use crate::Result;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Timing and naming used while extracting posts
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// How long to wait for the post container to render
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    /// Prepended to every generated uuid
    pub uuid_prefix: String,
}

/// Extracts the post at `href`
///
/// # Steps
///
/// 1. Navigate and wait for `.blog-post` (fatal on timeout)
/// 2. Read title text and href from the title link (required)
/// 3. Read the posted date (required)
/// 4. Resolve the hero image against the page origin (absent if missing)
/// 5. Collect paragraph texts in document order
/// 6. With no paragraphs, record the first Google Drive iframe
///
/// # Errors
///
/// * `Navigation` - The page failed to load
/// * `ElementNotFound` - The container, title link or date is missing
pub async fn extract_post<B>(
    session: &mut B,
    href: &str,
    settings: &ExtractionSettings,
) -> Result<PostRecord>
where
    B: BrowserSession + ?Sized,
{
    session.navigate(href).await?;
    session
        .wait_for(
            selectors::POST_CONTAINER,
            settings.wait_timeout,
            settings.poll_interval,
        )
        .await?;

    if let Err(e) = session.scroll_into_view(selectors::POST_CONTAINER).await {
        tracing::warn!("Could not scroll to '{}': {}", selectors::POST_CONTAINER, e);
    }

    let title_link = session.find(selectors::POST_TITLE_LINK).await?;
    let title = title_link.text.clone();
    let post_href = title_link.href().unwrap_or(href).to_string();

    let posted_date = session.find(selectors::POST_DATE).await?.text;

    let image_src = match session.find_first(selectors::HERO_IMAGE).await? {
        Some(image) => image
            .src()
            .and_then(|src| absolute_url(session.current_url(), src)),
        None => {
            tracing::debug!("No hero image on {}", href);
            None
        }
    };

    let content: Vec<String> = session
        .find_all(selectors::POST_PARAGRAPHS)
        .await?
        .into_iter()
        .map(|paragraph| paragraph.text)
        .collect();

    let embedded_media_src = if content.is_empty() {
        find_embedded_viewer(session).await?
    } else {
        None
    };

    Ok(PostRecord {
        uuid: format!("{}{}", settings.uuid_prefix, Uuid::new_v4()),
        title,
        href: post_href,
        posted_date,
        image_src,
        content,
        embedded_media_src,
    })
}

/// Finds the first iframe pointing at Google Drive
async fn find_embedded_viewer<B>(session: &mut B) -> Result<Option<String>>
where
    B: BrowserSession + ?Sized,
{
    let viewer = session
        .find_all(selectors::IFRAME)
        .await?
        .into_iter()
        .filter_map(|frame| frame.src().map(str::to_string))
        .find(|src| src.contains(selectors::EMBEDDED_VIEWER_HOST));
    Ok(viewer)
}

/// Resolves `src` against the origin of the page it was found on
fn absolute_url(page_url: Option<&str>, src: &str) -> Option<String> {
    if src.trim().is_empty() {
        return None;
    }

    match page_url.map(Url::parse) {
        Some(Ok(base)) => base.join(src).ok().map(String::from),
        // Without a page URL only an already-absolute src is usable
        _ => Url::parse(src).ok().map(String::from),
    }
}
