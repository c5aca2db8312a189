//! Inclusive date windows over message timestamps.
//!
//! This module provides [`DateWindow`], the `[start, end]` calendar range a run
//! harvests, and [`parse_date`] for the `YYYY-MM-DD` strings found in config
//! files and on the command line.
//!
//! # Examples
//!
//! ```
//! use tgharvest::core::filter::{DateWindow, WindowPosition};
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> tgharvest::Result<()> {
//! let window = DateWindow::parse("2024-01-01", "2024-01-31")?;
//!
//! let inside = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
//! let after = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
//!
//! assert_eq!(window.position(&inside), WindowPosition::Within);
//! assert_eq!(window.position(&after), WindowPosition::After);
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - Both bounds are inclusive and compare against the UTC calendar date
//! - `start` must not be after `end`

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{HarvestError, Result};

/// Date format accepted for window bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date string.
///
/// # Errors
///
/// Returns [`HarvestError::InvalidDate`] if the format is invalid.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
        .map_err(|_| HarvestError::invalid_date(date_str))
}

/// Where a timestamp falls relative to a [`DateWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Earlier than the first day of the window.
    Before,
    /// On or between the window bounds.
    Within,
    /// Later than the last day of the window.
    After,
}

/// An inclusive `[start, end]` range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Creates a window from two dates.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(HarvestError::config(format!(
                "start_date ({start}) is after end_date ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a window from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Creates a window covering a single day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// First day of the window.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns `true` if `day` lies inside the window.
    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Returns `true` if `ts` falls on a day inside the window.
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.contains_day(ts.date_naive())
    }

    /// Classifies a timestamp against the window.
    pub fn position(&self, ts: &DateTime<Utc>) -> WindowPosition {
        let day = ts.date_naive();
        if day < self.start {
            WindowPosition::Before
        } else if day > self.end {
            WindowPosition::After
        } else {
            WindowPosition::Within
        }
    }

    /// Exclusive upper bound: midnight UTC of the day after `end`.
    ///
    /// `None` when `end` is the last representable date.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.end
            .succ_opt()
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(parse_date("2024-01-15").unwrap(), day(2024, 1, 15));
        assert_eq!(parse_date(" 2024-01-15 ").unwrap(), day(2024, 1, 15));
    }

    #[test]
    fn test_parse_date_invalid() {
        for bad in ["", "15-01-2024", "2024/01/15", "2024-13-01", "2024-02-30", "yesterday"] {
            let err = parse_date(bad).unwrap_err();
            assert!(err.is_config(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let err = DateWindow::parse("2024-02-01", "2024-01-01").unwrap_err();
        assert!(err.to_string().contains("after end_date"));
    }

    #[test]
    fn test_window_accepts_same_day() {
        let window = DateWindow::parse("2024-01-01", "2024-01-01").unwrap();
        assert_eq!(window.days(), 1);
        assert_eq!(window, DateWindow::single_day(day(2024, 1, 1)));
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_position_bounds_are_inclusive() {
        let window = DateWindow::parse("2024-01-01", "2024-01-31").unwrap();

        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        assert_eq!(window.position(&first), WindowPosition::Within);
        assert_eq!(window.position(&last), WindowPosition::Within);
        assert_eq!(window.position(&before), WindowPosition::Before);
        assert_eq!(window.position(&after), WindowPosition::After);
        assert!(window.contains(&first));
        assert!(!window.contains(&after));
    }

    #[test]
    fn test_upper_bound_is_next_midnight() {
        let window = DateWindow::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(
            window.upper_bound(),
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_upper_bound_at_max_date() {
        let window = DateWindow::single_day(NaiveDate::MAX);
        assert!(window.upper_bound().is_none());
    }

    #[test]
    fn test_display() {
        let window = DateWindow::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(window.to_string(), "2024-01-01..=2024-01-31");
    }
}
