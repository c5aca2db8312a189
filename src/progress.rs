//! Progress reporting for channel scans.
//!
//! A [`ProgressCallback`] receives one [`Progress`] update per history page,
//! so callers can show how far back through the date window a scan has
//! reached without polling the iterator.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tgharvest::progress::{Progress, ProgressCallback};
//!
//! let callback: ProgressCallback = Arc::new(|progress: &Progress| {
//!     if let Some(pct) = progress.percentage() {
//!         println!("{}: {:.1}%", progress.channel, pct);
//!     }
//! });
//! # let _ = callback;
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};

use crate::channel::ChannelId;
use crate::core::filter::DateWindow;

/// State of one channel scan after a page was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// The channel being scanned.
    pub channel: ChannelId,

    /// The window being collected.
    pub window: DateWindow,

    /// Pages received so far.
    pub pages: usize,

    /// Messages received so far, in or out of the window.
    pub received: usize,

    /// Oldest message date seen so far.
    pub oldest: Option<DateTime<Utc>>,
}

impl Progress {
    /// Creates progress for a scan that has not received anything yet.
    pub fn new(channel: ChannelId, window: DateWindow) -> Self {
        Self {
            channel,
            window,
            pages: 0,
            received: 0,
            oldest: None,
        }
    }

    /// Share of the window already covered, walking back from its end
    /// (0.0 - 100.0).
    ///
    /// Returns `None` until a message has been seen.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use tgharvest::core::DateWindow;
    /// use tgharvest::progress::Progress;
    /// use tgharvest::ChannelId;
    ///
    /// let window = DateWindow::parse("2024-01-01", "2024-01-02").unwrap();
    /// let mut progress = Progress::new(ChannelId::parse("@a").unwrap(), window);
    /// assert_eq!(progress.percentage(), None);
    ///
    /// progress.oldest = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    /// assert_eq!(progress.percentage(), Some(50.0));
    /// ```
    pub fn percentage(&self) -> Option<f64> {
        let oldest = self.oldest?;
        let upper = self.window.upper_bound()?;
        let lower = self.window.start().and_time(NaiveTime::MIN).and_utc();

        let total = (upper - lower).num_seconds();
        let covered = (upper - oldest).num_seconds().clamp(0, total);
        Some(if total == 0 {
            100.0
        } else {
            covered as f64 / total as f64 * 100.0
        })
    }

    /// Returns `true` once the scan has reached the start of the window.
    pub fn reached_start(&self) -> bool {
        self.oldest
            .is_some_and(|oldest| oldest.date_naive() < self.window.start())
    }

    pub(crate) fn record_page(&mut self, dates: impl Iterator<Item = DateTime<Utc>>) {
        self.pages += 1;
        for date in dates {
            self.received += 1;
            self.oldest = Some(self.oldest.map_or(date, |oldest| oldest.min(date)));
        }
    }
}

/// Callback type for receiving progress updates.
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Creates a callback that prints one line per page to stderr.
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|progress: &Progress| match progress.percentage() {
        Some(pct) => eprintln!(
            "   ⏳ {}: page {}, {} messages scanned ({:.0}% of range)",
            progress.channel,
            progress.pages,
            progress.received,
            pct
        ),
        None => eprintln!("   ⏳ {}: page {}, no messages", progress.channel, progress.pages),
    })
}
