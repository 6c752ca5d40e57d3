/// Crawl state definitions for a single variant run
///
/// The run walks the site from its home page down to individual posts.
use std::fmt;

/// Represents the current step of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Navigation States =====
    /// Nothing has been loaded yet
    Idle,

    /// The site root has loaded
    HomeLoaded,

    /// The navigation menu was located (activated or not)
    MenuResolved,

    /// The latest-updates index page has loaded
    UpdatesIndexLoaded,

    /// Today's targets have been collected into the collection
    TargetsDiscovered,

    // ===== Extraction State =====
    /// Posts are being extracted target by target
    ExtractingPosts,

    // ===== Terminal States =====
    /// The run finished, with or without posts
    Done,

    /// The run stopped on an error
    Aborted,
}

impl CrawlState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Checks whether moving from `self` to `next` is a legal step
    ///
    /// Any non-terminal state may abort. `Idle -> ExtractingPosts` is the
    /// resume path, which skips navigation entirely.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;

        if next == Aborted {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, HomeLoaded)
                | (Idle, ExtractingPosts)
                | (HomeLoaded, MenuResolved)
                | (MenuResolved, UpdatesIndexLoaded)
                | (UpdatesIndexLoaded, TargetsDiscovered)
                | (UpdatesIndexLoaded, Done)
                | (TargetsDiscovered, ExtractingPosts)
                | (TargetsDiscovered, Done)
                | (ExtractingPosts, Done)
        )
    }

    /// Converts the state to the label used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HomeLoaded => "home_loaded",
            Self::MenuResolved => "menu_resolved",
            Self::UpdatesIndexLoaded => "updates_index_loaded",
            Self::TargetsDiscovered => "targets_discovered",
            Self::ExtractingPosts => "extracting_posts",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }

    /// Returns all possible crawl states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::HomeLoaded,
            Self::MenuResolved,
            Self::UpdatesIndexLoaded,
            Self::TargetsDiscovered,
            Self::ExtractingPosts,
            Self::Done,
            Self::Aborted,
        ]
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
