//! Crawl state machine - orchestration of one variant's run
//!
//! The crawler walks the site in a fixed sequence:
//! - Load the home page and try to open the navigation menu
//! - Follow the updates menu option (or the fallback updates URL)
//! - Pick today's entry from the updates index
//! - Collect department (public) or business (private) targets
//! - Extract one post per target, persisting after every post
//!
//! A persisted, unfinished run is resumed at its cursor instead of being
//! navigated again.

use crate::browser::BrowserSession;
use crate::config::{BrowserConfig, Config, SiteConfig, SiteVariant, VariantConfig};
use crate::crawler::extractor::{extract_post, ExtractionSettings};
use crate::crawler::selectors;
use crate::links::{target_label, LinkClass, LinkClassifier, TodayPattern};
use crate::state::CrawlState;
use crate::storage::{
    CrawlCollection, JsonStorage, NavigationTarget, PersistedRun, ProgressCursor, Storage,
};
use crate::{CrawlError, Result};

/// How a run treats state persisted by an earlier run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Continue an unfinished run if one was persisted
    #[default]
    Resume,
    /// Discard the persisted cursor and start from an empty collection
    Fresh,
}

/// Non-error end states of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Every target has its post
    Completed {
        targets: usize,
        posts_extracted: usize,
        resumed: bool,
    },
    /// The updates index has no entry for today
    NoUpdatesToday,
}

/// State machine driving one variant's crawl
///
/// Owns the browser session, the storage and the collection for the whole
/// run. The session is closed when [`Crawler::run`] returns, whatever the
/// outcome.
pub struct Crawler<B: BrowserSession, S: Storage = JsonStorage> {
    site: SiteConfig,
    timing: BrowserConfig,
    name: String,
    variant: SiteVariant,
    classifier: LinkClassifier,
    session: B,
    storage: S,
    collection: CrawlCollection,
    cursor: ProgressCursor,
    state: CrawlState,
}

impl<B: BrowserSession, S: Storage> Crawler<B, S> {
    /// Creates a crawler for one configured variant, matching against today
    pub fn new(config: &Config, variant: &VariantConfig, session: B, storage: S) -> Self {
        Self {
            site: config.site.clone(),
            timing: config.browser.clone(),
            name: variant.name.clone(),
            variant: variant.kind,
            classifier: LinkClassifier::new(variant.kind, TodayPattern::today()),
            session,
            storage,
            collection: CrawlCollection::new(variant.kind, variant.name.clone()),
            cursor: ProgressCursor::default(),
            state: CrawlState::Idle,
        }
    }

    /// Replaces the date used to find today's updates
    pub fn with_today(mut self, today: TodayPattern) -> Self {
        self.classifier = LinkClassifier::new(self.variant, today);
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn collection(&self) -> &CrawlCollection {
        &self.collection
    }

    pub fn cursor(&self) -> ProgressCursor {
        self.cursor
    }

    pub fn session(&self) -> &B {
        &self.session
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs the state machine to a terminal state
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The run reached `Done`
    /// * `Err(CrawlError)` - The run was aborted; progress persisted so far
    ///   is kept for the next run
    pub async fn run(&mut self, mode: StartMode) -> Result<CrawlOutcome> {
        tracing::info!("{} spider has launched", self.name);

        let result = self.drive(mode).await;

        if let Err(e) = &result {
            tracing::error!("{} aborted in state {}: {}", self.name, self.state, e);
            if !self.state.is_terminal() {
                self.state = CrawlState::Aborted;
            }
        }

        if let Err(e) = self.session.close().await {
            tracing::warn!("{} failed to close browser session: {}", self.name, e);
        }

        result
    }

    async fn drive(&mut self, mode: StartMode) -> Result<CrawlOutcome> {
        if let Some(run) = self.resumable_run(mode)? {
            tracing::info!(
                "{} resuming at target {} of {}",
                self.name,
                run.cursor.last_completed_index + 1,
                run.collection.target_count()
            );
            self.collection = run.collection;
            self.cursor = run.cursor;
            self.transition(CrawlState::ExtractingPosts)?;
            return self.extract_posts(true).await;
        }

        self.collection = CrawlCollection::new(self.variant, self.name.clone());
        self.cursor = ProgressCursor::default();

        let index_url = self.load_home().await?;
        self.load_updates_index(&index_url).await?;

        let todays_update = match self.find_todays_update().await? {
            Some(url) => url,
            None => {
                tracing::warn!("{}, no job posts for today", self.name);
                self.transition(CrawlState::Done)?;
                return Ok(CrawlOutcome::NoUpdatesToday);
            }
        };

        match self.variant {
            SiteVariant::Public => self.discover_departments(&todays_update).await?,
            SiteVariant::Private => self.discover_businesses(&todays_update).await?,
        }
        self.transition(CrawlState::TargetsDiscovered)?;

        let found = self.collection.target_count();
        tracing::info!("{} found {} vacancy updates page links", self.name, found);

        if found == 0 {
            self.transition(CrawlState::Done)?;
            return Ok(CrawlOutcome::Completed {
                targets: 0,
                posts_extracted: 0,
                resumed: false,
            });
        }

        // Targets are saved up front so a crash on the first post can resume
        self.storage.save_collection(&self.collection)?;
        self.storage.save_progress(self.cursor, &self.collection)?;

        self.transition(CrawlState::ExtractingPosts)?;
        self.extract_posts(false).await
    }

    /// Loads the persisted run when resuming and there is work left in it
    fn resumable_run(&mut self, mode: StartMode) -> Result<Option<PersistedRun>> {
        match mode {
            StartMode::Fresh => {
                tracing::info!("{} starting fresh, ignoring previous progress", self.name);
                self.storage.clear_progress()?;
                // An output snapshot alone is enough for load() to rebuild a run
                let empty = CrawlCollection::new(self.variant, self.name.clone());
                self.storage.save_collection(&empty)?;
                Ok(None)
            }
            StartMode::Resume => match self.storage.load()? {
                Some(run) if run.is_resumable() => Ok(Some(run)),
                Some(_) => {
                    tracing::info!("{} previous run finished, starting a new one", self.name);
                    Ok(None)
                }
                None => Ok(None),
            },
        }
    }

    /// Idle -> HomeLoaded -> MenuResolved
    ///
    /// Returns the URL of the updates index to follow.
    async fn load_home(&mut self) -> Result<String> {
        tracing::info!("{} home page loading...", self.name);
        self.session.navigate(&self.site.home_url).await?;
        self.transition(CrawlState::HomeLoaded)?;

        if let Err(e) = self.session.activate(selectors::MENU).await {
            if !e.is_recoverable() {
                return Err(e);
            }
            tracing::warn!("Could not click element with attribute '{}'", selectors::MENU);
        }

        let keyword = self.site.menu_keyword.to_lowercase();
        let from_menu = self
            .session
            .find_all(selectors::MENU_OPTIONS)
            .await?
            .into_iter()
            .find(|option| option.text.to_lowercase().contains(&keyword))
            .and_then(|option| option.href().map(str::to_string));

        let url = match from_menu {
            Some(url) => url,
            None => {
                tracing::debug!(
                    "No menu option mentions '{}', using {}",
                    keyword,
                    self.site.updates_url
                );
                self.site.updates_url.clone()
            }
        };

        tracing::info!("{} home page loaded...", self.name);
        self.transition(CrawlState::MenuResolved)?;
        Ok(url)
    }

    /// MenuResolved -> UpdatesIndexLoaded
    async fn load_updates_index(&mut self, url: &str) -> Result<()> {
        tracing::info!("{} loading vacancy updates page...", self.name);
        self.session.navigate(url).await?;
        self.session
            .wait_for(
                selectors::INDEX_ENTRY,
                self.timing.wait_timeout(),
                self.timing.poll_interval(),
            )
            .await?;
        self.scroll_to(selectors::INDEX_ENTRY).await?;
        self.transition(CrawlState::UpdatesIndexLoaded)
    }

    /// Returns the href of the first index entry that mentions today
    async fn find_todays_update(&mut self) -> Result<Option<String>> {
        let entries: Vec<_> = self
            .session
            .find_all(selectors::INDEX_ENTRY)
            .await?
            .into_iter()
            .filter(|entry| entry.href().is_some())
            .collect();

        let today = self.classifier.today();
        let position = today.first_match(entries.iter().map(|e| e.text.as_str()));
        Ok(position.and_then(|i| entries[i].href().map(str::to_string)))
    }

    /// Opens today's update and records every department link on it
    async fn discover_departments(&mut self, url: &str) -> Result<()> {
        self.open_listing(url).await?;
        tracing::info!("{} scraping vacancy updates page links...", self.name);

        for link in self.session.find_all(selectors::LISTING_LINKS).await? {
            let Some(href) = link.href() else { continue };
            if self
                .classifier
                .is_department_target(&link.text, href, &self.site.origin)
            {
                self.collection
                    .insert_target(NavigationTarget::new(target_label(&link.text), href));
            }
        }
        Ok(())
    }

    /// Opens today's update, follows its sector switch link and records
    /// every business link on the sector page
    async fn discover_businesses(&mut self, url: &str) -> Result<()> {
        self.open_listing(url).await?;
        tracing::info!("{} scraping vacancy updates page links...", self.name);

        // The last sector link on the page wins
        let sector_url = self
            .session
            .find_all(selectors::LISTING_LINKS)
            .await?
            .into_iter()
            .filter_map(|link| {
                let href = link.href()?;
                (self.classifier.classify(&link.text, href, &self.site.origin)
                    == LinkClass::SectorSwitchLink)
                    .then(|| href.to_string())
            })
            .last();

        let Some(sector_url) = sector_url else {
            tracing::warn!("{}, no private sector listing linked today", self.name);
            return Ok(());
        };

        self.open_listing(&sector_url).await?;
        for link in self.session.find_all(selectors::LISTING_LINKS).await? {
            let Some(href) = link.href() else { continue };
            if self
                .classifier
                .is_business_target(&link.text, href, &self.site.origin)
            {
                self.collection
                    .insert_target(NavigationTarget::new(target_label(&link.text), href));
            }
        }
        Ok(())
    }

    /// Navigates to a listing page and lets it settle before reading links
    async fn open_listing(&mut self, url: &str) -> Result<()> {
        self.session.navigate(url).await?;
        tracing::info!("{} vacancy updates page loaded...", self.name);
        tokio::time::sleep(self.timing.settle_delay()).await;
        self.scroll_to(selectors::LISTING_LINKS).await
    }

    /// ExtractingPosts -> Done
    async fn extract_posts(&mut self, resumed: bool) -> Result<CrawlOutcome> {
        let total = self.collection.target_count();
        let start = self.cursor.last_completed_index;
        let settings = ExtractionSettings {
            wait_timeout: self.timing.wait_timeout(),
            poll_interval: self.timing.poll_interval(),
            uuid_prefix: self.variant.uuid_prefix().to_string(),
        };

        tracing::info!("{} scraping vacancy updates page links content...", self.name);

        let pending: Vec<NavigationTarget> =
            self.collection.targets().iter().skip(start).cloned().collect();
        for (offset, target) in pending.iter().enumerate() {
            tracing::info!(
                "{}/{}, scraping {} data",
                start + offset + 1,
                total,
                target.label
            );

            let post = extract_post(&mut self.session, &target.href, &settings).await?;
            self.collection.append_post(post)?;
            self.storage.save_collection(&self.collection)?;

            self.cursor = self.cursor.advanced();
            self.storage.save_progress(self.cursor, &self.collection)?;
        }

        self.transition(CrawlState::Done)?;
        tracing::info!("{} done", self.name);

        Ok(CrawlOutcome::Completed {
            targets: total,
            posts_extracted: pending.len(),
            resumed,
        })
    }

    /// Scrolls to an element, tolerating failure
    async fn scroll_to(&mut self, selector: &str) -> Result<()> {
        match self.session.scroll_into_view(selector).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Could not scroll to element '{}'", selector);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn transition(&mut self, next: CrawlState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }
}
