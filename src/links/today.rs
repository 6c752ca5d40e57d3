//! Matching of "today" against free-form index link text

use chrono::{Local, NaiveDate};

/// The three spellings of a date the site uses in its daily update titles
///
/// Matching is a case-insensitive substring test against any of the full
/// date (`05 april 2024`), the day and month (`05 april`), or the weekday
/// (`friday`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayPattern {
    full_date: String,
    day_month: String,
    weekday: String,
}

impl TodayPattern {
    /// Builds the pattern for a specific calendar date
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            full_date: date.format("%d %B %Y").to_string().to_lowercase(),
            day_month: date.format("%d %B").to_string().to_lowercase(),
            weekday: date.format("%A").to_string().to_lowercase(),
        }
    }

    /// Builds the pattern for the local calendar date
    pub fn today() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn full_date(&self) -> &str {
        &self.full_date
    }

    pub fn day_month(&self) -> &str {
        &self.day_month
    }

    pub fn weekday(&self) -> &str {
        &self.weekday
    }

    /// Returns true if `text` mentions today in any of the three spellings
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        [&self.full_date, &self.day_month, &self.weekday]
            .iter()
            .any(|needle| text.contains(needle.as_str()))
    }

    /// Returns the index of the first entry that mentions today
    ///
    /// Entries are checked in the order given, which callers keep equal to
    /// document order.
    pub fn first_match<'a, I>(&self, texts: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().position(|text| self.matches(text))
    }
}
