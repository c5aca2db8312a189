//! Date-bounded, lazily paginated channel history.
//!
//! [`fetch`] resolves a channel and returns a [`ChannelHistory`], an iterator
//! that pulls pages from the session only as fast as it is consumed and
//! yields the messages that fall inside a [`DateWindow`].
//!
//! # Boundary rules
//!
//! For each message, compared on its UTC calendar date:
//!
//! | Position | [`ScanMode::StopAtWindowStart`] | [`ScanMode::FullRange`] |
//! |----------|-------------------------------|-------------------------|
//! | after `end` | skip | skip |
//! | within | yield | yield |
//! | before `start` | **stop paginating** | skip |
//!
//! Stopping early is only sound when the feed is strictly newest-first, so
//! the fetcher falls back to a full scan whenever the session does not
//! guarantee that ordering or the run disables it.
//!
//! # Example
//!
//! ```rust
//! use tgharvest::core::fetcher::{FetchOptions, fetch};
//! use tgharvest::core::filter::DateWindow;
//! use tgharvest::session::MemorySession;
//! use tgharvest::{ChannelId, RawMessage};
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> tgharvest::Result<()> {
//! let at = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
//! let mut session = MemorySession::new().with_channel(
//!     "@test",
//!     vec![
//!         RawMessage::new(3, at(2024, 2, 1)),
//!         RawMessage::new(2, at(2024, 1, 15)),
//!         RawMessage::new(1, at(2023, 12, 31)),
//!     ],
//! );
//!
//! let window = DateWindow::parse("2024-01-01", "2024-01-31")?;
//! let channel = ChannelId::parse("@test")?;
//! let ids: Vec<i64> = fetch(&mut session, &channel, window, FetchOptions::default())?
//!     .map(|m| m.map(|m| m.id))
//!     .collect::<tgharvest::Result<_>>()?;
//!
//! assert_eq!(ids, [2]);
//! # Ok(())
//! # }
//! ```

use std::iter::FusedIterator;

use tracing::debug;

use crate::channel::ChannelId;
use crate::config::{DEFAULT_PAGE_SIZE, Settings};
use crate::core::filter::{DateWindow, WindowPosition};
use crate::error::Result;
use crate::message::RawMessage;
use crate::progress::{Progress, ProgressCallback};
use crate::session::{ChannelHandle, HistoryRequest, HistorySession};

/// How the fetcher treats messages older than the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// The first older message ends pagination.
    StopAtWindowStart,
    /// Older messages are skipped and pagination runs to the end of history.
    FullRange,
}

/// Tunables for [`fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Messages per page request (default: 100)
    pub page_size: usize,

    /// Allow early termination when the session is newest-first (default: true)
    pub assume_descending: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            assume_descending: true,
        }
    }
}

impl FetchOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives options from run settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            page_size: settings.page_size(),
            assume_descending: settings.session().assume_descending,
        }
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Sets whether early termination is allowed.
    #[must_use]
    pub fn with_assume_descending(mut self, enabled: bool) -> Self {
        self.assume_descending = enabled;
        self
    }
}

/// Resolves `channel` and returns its history restricted to `window`.
///
/// Resolution happens eagerly, so an inaccessible channel is reported here
/// rather than on first iteration. No history page is requested until the
/// iterator is polled.
///
/// # Errors
///
/// Returns [`HarvestError::ChannelAccess`](crate::HarvestError::ChannelAccess)
/// if the session refuses the channel.
pub fn fetch<'s, S>(
    session: &'s mut S,
    channel: &ChannelId,
    window: DateWindow,
    options: FetchOptions,
) -> Result<ChannelHistory<'s, S>>
where
    S: HistorySession + ?Sized,
{
    let handle = session.resolve(channel)?;
    let mode = if options.assume_descending && session.guarantees_descending() {
        ScanMode::StopAtWindowStart
    } else {
        ScanMode::FullRange
    };
    debug!(channel = %channel, window = %window, ?mode, "starting history scan");

    let first = HistoryRequest::first(options.page_size.max(1)).with_offset_date(window.upper_bound());

    Ok(ChannelHistory {
        session,
        channel: handle,
        window,
        mode,
        buffered: Vec::new().into_iter(),
        next_request: Some(first),
        finished: false,
        stats: FetchStats::default(),
        progress: None,
    })
}

/// Counters describing one history scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Page requests issued.
    pub pages: usize,
    /// Messages inside the window.
    pub yielded: usize,
    /// Messages skipped for being newer than the window.
    pub skipped_newer: usize,
    /// Messages skipped for being older than the window.
    pub skipped_older: usize,
}

/// Lazy iterator over the in-window history of one channel.
///
/// Yields `Err` at most once, when a page request fails; the sequence ends
/// after that.
pub struct ChannelHistory<'s, S: HistorySession + ?Sized> {
    session: &'s mut S,
    channel: ChannelHandle,
    window: DateWindow,
    mode: ScanMode,
    buffered: std::vec::IntoIter<RawMessage>,
    next_request: Option<HistoryRequest>,
    finished: bool,
    stats: FetchStats,
    progress: Option<(Progress, ProgressCallback)>,
}

impl<S: HistorySession + ?Sized> ChannelHistory<'_, S> {
    /// Reports a [`Progress`] update to `callback` after every page.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        let progress = Progress::new(self.channel.requested.clone(), self.window);
        self.progress = Some((progress, callback));
        self
    }

    /// The resolved channel.
    pub fn channel(&self) -> &ChannelHandle {
        &self.channel
    }

    /// The scan mode in effect.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Counters so far.
    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.next_request = None;
            debug!(
                channel = %self.channel.requested,
                pages = self.stats.pages,
                yielded = self.stats.yielded,
                skipped_newer = self.stats.skipped_newer,
                skipped_older = self.stats.skipped_older,
                "history scan finished"
            );
        }
    }
}

impl<S: HistorySession + ?Sized> Iterator for ChannelHistory<'_, S> {
    type Item = Result<RawMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(msg) = self.buffered.next() {
                match self.window.position(&msg.date) {
                    WindowPosition::Within => {
                        self.stats.yielded += 1;
                        return Some(Ok(msg));
                    }
                    WindowPosition::After => self.stats.skipped_newer += 1,
                    WindowPosition::Before => {
                        self.stats.skipped_older += 1;
                        if self.mode == ScanMode::StopAtWindowStart {
                            self.finish();
                            return None;
                        }
                    }
                }
                continue;
            }

            let Some(request) = self.next_request.take() else {
                self.finish();
                return None;
            };

            match self.session.history_page(&self.channel, &request) {
                Ok(page) => {
                    self.stats.pages += 1;
                    debug!(
                        channel = %self.channel.requested,
                        page = self.stats.pages,
                        messages = page.messages.len(),
                        more = page.next.is_some(),
                        "fetched history page"
                    );
                    if let Some((progress, callback)) = &mut self.progress {
                        progress.record_page(page.messages.iter().map(|m| m.date));
                        callback(progress);
                    }
                    if page.messages.is_empty() {
                        self.finish();
                        return None;
                    }
                    self.next_request = page.next.map(|cursor| request.continue_from(cursor));
                    self.buffered = page.messages.into_iter();
                }
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<S: HistorySession + ?Sized> FusedIterator for ChannelHistory<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    fn msg(id: i64, y: i32, m: u32, d: u32) -> RawMessage {
        RawMessage::new(id, Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    fn january() -> DateWindow {
        DateWindow::parse("2024-01-01", "2024-01-31").unwrap()
    }

    fn channel(id: &str) -> ChannelId {
        ChannelId::parse(id).unwrap()
    }

    fn ids<S: HistorySession + ?Sized>(history: ChannelHistory<'_, S>) -> Vec<i64> {
        history.map(|m| m.unwrap().id).collect()
    }

    // =========================================================================
    // Window boundaries
    // =========================================================================

    #[test]
    fn test_only_in_window_messages_are_yielded() {
        let mut session = MemorySession::new().with_channel(
            "@test",
            vec![msg(3, 2024, 2, 1), msg(2, 2024, 1, 15), msg(1, 2023, 12, 31)],
        );
        let history = fetch(&mut session, &channel("@test"), january(), FetchOptions::default()).unwrap();
        assert_eq!(ids(history), [2]);
    }

    #[test]
    fn test_boundary_days_are_inclusive() {
        let mut session = MemorySession::new().with_channel(
            "@test",
            vec![
                RawMessage::new(3, Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()),
                RawMessage::new(2, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ],
        );
        let history = fetch(&mut session, &channel("@test"), january(), FetchOptions::default()).unwrap();
        assert_eq!(ids(history), [3, 2]);
    }

    #[test]
    fn test_empty_history() {
        let mut session = MemorySession::new().with_channel("@empty", vec![]);
        let mut history =
            fetch(&mut session, &channel("@empty"), january(), FetchOptions::default()).unwrap();
        assert!(history.next().is_none());
        assert!(history.next().is_none());
        assert_eq!(history.stats().pages, 1);
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    #[test]
    fn test_stops_requesting_after_older_message() {
        let mut feed: Vec<RawMessage> = (0..10).map(|i| msg(100 - i, 2024, 1, 20)).collect();
        feed.push(msg(50, 2023, 12, 1));
        feed.extend((0..20).map(|i| msg(40 - i, 2023, 11, 1)));

        let mut session = MemorySession::new().with_channel("@busy", feed);
        let options = FetchOptions::default().with_page_size(4);
        let history = fetch(&mut session, &channel("@busy"), january(), options).unwrap();
        assert_eq!(ids(history).len(), 10);
        // 10 in-window messages plus the terminating one fit in 3 pages of 4.
        assert_eq!(session.page_requests("@busy"), 3);
    }

    #[test]
    fn test_skips_newer_messages_across_pages() {
        let mut feed: Vec<RawMessage> = (0..7).map(|i| msg(100 - i, 2024, 3, 1)).collect();
        feed.push(msg(5, 2024, 1, 10));
        let mut session = MemorySession::new().with_channel("@new", feed);

        let options = FetchOptions::default().with_page_size(3);
        let history = fetch(&mut session, &channel("@new"), january(), options).unwrap();
        let stats_before = history.stats();
        assert_eq!(stats_before.pages, 0);
        assert_eq!(ids(history), [5]);
        assert_eq!(session.page_requests("@new"), 3);
    }

    #[test]
    fn test_first_request_carries_offset_and_cursor_follows() {
        let feed: Vec<RawMessage> = (0..5).map(|i| msg(10 - i, 2024, 1, 20)).collect();
        let mut session = MemorySession::new().with_channel("@c", feed);
        let options = FetchOptions::default().with_page_size(2);
        let history = fetch(&mut session, &channel("@c"), january(), options).unwrap();
        assert_eq!(ids(history).len(), 5);

        let requests = session.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].request.cursor.is_none());
        assert_eq!(
            requests[0].request.offset_date,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
        assert!(requests[1].request.cursor.is_some());
        assert_eq!(requests[1].request.offset_date, requests[0].request.offset_date);
        assert!(requests.iter().all(|r| r.request.limit == 2));
    }

    #[test]
    fn test_is_lazy() {
        let feed: Vec<RawMessage> = (0..10).map(|i| msg(10 - i, 2024, 1, 20)).collect();
        let mut session = MemorySession::new().with_channel("@lazy", feed);
        let options = FetchOptions::default().with_page_size(2);
        {
            let mut history = fetch(&mut session, &channel("@lazy"), january(), options).unwrap();
            assert_eq!(history.next().unwrap().unwrap().id, 10);
            assert_eq!(history.stats().pages, 1);
        }
        assert_eq!(session.page_requests("@lazy"), 1);
    }

    // =========================================================================
    // Ordering guarantees
    // =========================================================================

    #[test]
    fn test_full_range_when_session_is_unordered() {
        let feed = vec![msg(3, 2024, 1, 20), msg(1, 2023, 12, 1), msg(2, 2024, 1, 5)];
        let mut session = MemorySession::new().with_channel("@mixed", feed).unordered();
        let history = fetch(&mut session, &channel("@mixed"), january(), FetchOptions::default()).unwrap();
        assert_eq!(history.mode(), ScanMode::FullRange);
        assert_eq!(ids(history), [3, 2]);
    }

    #[test]
    fn test_full_range_when_disabled_by_options() {
        let feed = vec![msg(3, 2024, 1, 20), msg(1, 2023, 12, 1), msg(2, 2024, 1, 5)];
        let mut session = MemorySession::new().with_channel("@mixed", feed);
        let options = FetchOptions::default().with_assume_descending(false);
        let history = fetch(&mut session, &channel("@mixed"), january(), options).unwrap();
        assert_eq!(ids(history), [3, 2]);
    }

    #[test]
    fn test_early_stop_when_descending() {
        let feed = vec![msg(3, 2024, 1, 20), msg(1, 2023, 12, 1), msg(2, 2024, 1, 5)];
        let mut session = MemorySession::new().with_channel("@mixed", feed);
        let history = fetch(&mut session, &channel("@mixed"), january(), FetchOptions::default()).unwrap();
        assert_eq!(history.mode(), ScanMode::StopAtWindowStart);
        assert_eq!(ids(history), [3]);
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[test]
    fn test_inaccessible_channel_fails_eagerly() {
        let mut session = MemorySession::new().with_inaccessible("@private", "private channel");
        let err = fetch(&mut session, &channel("@private"), january(), FetchOptions::default())
            .err()
            .unwrap();
        assert!(err.is_channel_access());
        assert!(session.requests().is_empty());
    }

    #[test]
    fn test_page_error_is_yielded_once() {
        let feed: Vec<RawMessage> = (0..6).map(|i| msg(10 - i, 2024, 1, 20)).collect();
        let mut session = MemorySession::new()
            .with_channel("@flaky", feed)
            .failing_at_page("@flaky", 1, "connection reset");
        let options = FetchOptions::default().with_page_size(2);
        let mut history = fetch(&mut session, &channel("@flaky"), january(), options).unwrap();

        assert!(history.next().unwrap().is_ok());
        assert!(history.next().unwrap().is_ok());
        let err = history.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(history.next().is_none());
    }

    #[test]
    fn test_progress_reported_per_page() {
        let feed: Vec<RawMessage> = (0..5).map(|i| msg(10 - i, 2024, 1, 20 - i as u32)).collect();
        let mut session = MemorySession::new().with_channel("@slow", feed);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |p: &Progress| {
            sink.lock().unwrap().push((p.pages, p.received, p.oldest));
        });

        let options = FetchOptions::default().with_page_size(2);
        let history = fetch(&mut session, &channel("@slow"), january(), options)
            .unwrap()
            .with_progress(callback);
        assert_eq!(ids(history).len(), 5);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].0, 3);
        assert_eq!(seen[2].1, 5);
        assert_eq!(seen[2].2, Some(msg(0, 2024, 1, 16).date));
    }

    #[test]
    fn test_options_from_settings() {
        let settings = Settings::new(vec![channel("@a")], january())
            .unwrap()
            .with_page_size(25)
            .with_session(crate::config::SessionSettings::new().with_assume_descending(false));
        let options = FetchOptions::from_settings(&settings);
        assert_eq!(options.page_size, 25);
        assert!(!options.assume_descending);
    }
}
