//! Link classification for index and category pages
//!
//! Every link collected from a listing page is sorted into exactly one
//! [`LinkClass`]. Which classes become navigation targets depends on the
//! [`SiteVariant`] being crawled.

mod today;

pub use today::TodayPattern;

use crate::config::SiteVariant;
use regex::Regex;
use std::sync::LazyLock;

static RE_READ_MORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)read more").expect("valid read-more pattern"));

static RE_SECTOR_SWITCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)private sector vacancies|private property opportunities|private sector opportunities|public sector opportunities",
    )
    .expect("valid sector-switch pattern")
});

/// Category assigned to a link found on a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// A department or business page holding one post
    DepartmentLink,
    /// A link into another sector's listing
    SectorSwitchLink,
    /// A "read more" teaser link duplicating another link
    NoiseLink,
    /// Empty text, foreign origin, or a link back to today's index entry
    Rejected,
}

impl LinkClass {
    /// Returns true if the link should never be followed
    pub fn is_discarded(&self) -> bool {
        matches!(self, Self::NoiseLink | Self::Rejected)
    }
}

/// Variant-aware link classifier
///
/// # Precedence
///
/// 1. `Rejected` when the trimmed text is empty or `href` is off-origin
/// 2. `NoiseLink` when the text contains "read more"
/// 3. `SectorSwitchLink` when the text names a sector listing
/// 4. `Rejected` (public only) when the text mentions today
/// 5. `DepartmentLink` otherwise
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    variant: SiteVariant,
    today: TodayPattern,
}

impl LinkClassifier {
    pub fn new(variant: SiteVariant, today: TodayPattern) -> Self {
        Self { variant, today }
    }

    pub fn today(&self) -> &TodayPattern {
        &self.today
    }

    /// Classifies a single link
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use vacancy_crawler::{LinkClass, LinkClassifier, SiteVariant, TodayPattern};
    ///
    /// let today = TodayPattern::for_date(NaiveDate::from_ymd_opt(2024, 4, 5).unwrap());
    /// let classifier = LinkClassifier::new(SiteVariant::Public, today);
    /// let origin = "https://www.govpage.co.za";
    ///
    /// assert_eq!(
    ///     classifier.classify("Department of Health", "https://www.govpage.co.za/health", origin),
    ///     LinkClass::DepartmentLink
    /// );
    /// assert_eq!(
    ///     classifier.classify("Read More", "https://www.govpage.co.za/health", origin),
    ///     LinkClass::NoiseLink
    /// );
    /// ```
    pub fn classify(&self, text: &str, href: &str, origin: &str) -> LinkClass {
        if text.trim().is_empty() || !href.starts_with(origin) {
            return LinkClass::Rejected;
        }

        if RE_READ_MORE.is_match(text) {
            return LinkClass::NoiseLink;
        }

        if RE_SECTOR_SWITCH.is_match(text) {
            return LinkClass::SectorSwitchLink;
        }

        // Today's index entry links back to itself from the department list
        if self.variant == SiteVariant::Public && self.today.matches(text) {
            return LinkClass::Rejected;
        }

        LinkClass::DepartmentLink
    }

    /// Returns true if a link on a department listing becomes a target
    pub fn is_department_target(&self, text: &str, href: &str, origin: &str) -> bool {
        self.classify(text, href, origin) == LinkClass::DepartmentLink
    }

    /// Returns true if a link on a private sector page becomes a target
    ///
    /// Anything that survives the origin and noise checks is accepted.
    pub fn is_business_target(&self, text: &str, href: &str, origin: &str) -> bool {
        !self.classify(text, href, origin).is_discarded()
    }
}

/// Normalizes link text into a target label: lowercased, left-trimmed
pub fn target_label(text: &str) -> String {
    text.to_lowercase().trim_start().to_string()
}
