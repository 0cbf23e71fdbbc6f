//! Calendar helpers shared by the aggregator, the dashboard and the trends report.
//!
//! All bucketing is done in UTC.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` window of timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest timestamp included
    pub start: DateTime<Utc>,
    /// Latest timestamp included
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range from two bounds.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The window `[now - months, now]`.
    #[must_use]
    pub fn trailing_months(now: DateTime<Utc>, months: u32) -> Self {
        let start = now.checked_sub_months(Months::new(months)).unwrap_or(now);
        Self { start, end: now }
    }

    /// Uses `range` when given, otherwise the trailing window ending at `now`.
    #[must_use]
    pub fn resolve(range: Option<Self>, now: DateTime<Utc>, default_months: u32) -> Self {
        range.unwrap_or_else(|| Self::trailing_months(now, default_months))
    }

    /// Whether `instant` falls inside the range.
    #[must_use]
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl Month {
    /// Builds a month, returning `None` unless `month` is in 1..=12.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month `instant` falls in.
    #[must_use]
    pub fn of(instant: &DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    /// Calendar year
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1-12
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The month before this one.
    #[must_use]
    pub const fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The month after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// `count` months ending with this one, oldest first.
    #[must_use]
    pub fn trailing(self, count: usize) -> Vec<Self> {
        let mut months = Vec::with_capacity(count);
        let mut cursor = self;
        for _ in 0..count {
            months.push(cursor);
            cursor = cursor.previous();
        }
        months.reverse();
        months
    }

    /// Midnight UTC on the first day of the month.
    #[must_use]
    pub fn start(self) -> DateTime<Utc> {
        // Month is validated at construction, so day 1 always exists.
        #[allow(clippy::expect_used)]
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|first| first.and_hms_opt(0, 0, 0))
            .expect("first day of a valid month is always valid")
            .and_utc()
    }

    /// Sortable key in `YYYY-MM` form.
    #[must_use]
    pub fn key(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Display label such as `Mar 2024`.
    #[must_use]
    pub fn label(self) -> String {
        let index = usize::try_from(self.month - 1).unwrap_or_default();
        format!("{} {}", MONTH_ABBREVIATIONS[index], self.year)
    }
}
