//! Per-channel orchestration: fetch, project, write.
//!
//! [`scrape_all`] walks the configured channels one at a time. A channel that
//! fails (inaccessible, broken mid-history, unwritable output) is logged and
//! recorded in the [`RunSummary`]; the loop moves on. Only fatal errors
//! (see [`HarvestError::is_fatal`]) end the run early.

use std::path::PathBuf;

use tracing::{info, info_span, warn};

use crate::channel::ChannelId;
use crate::config::Settings;
use crate::core::fetcher::{FetchOptions, fetch};
use crate::core::output::write_records;
use crate::core::projector::{ProjectedRecord, project};
use crate::error::{HarvestError, Result};
use crate::progress::ProgressCallback;
use crate::session::HistorySession;

/// Result of one successfully harvested channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    /// The channel as configured.
    pub channel: ChannelId,
    /// The file written.
    pub path: PathBuf,
    /// Number of records in the file.
    pub records: usize,
    /// Number of history pages requested.
    pub pages: usize,
}

/// A channel that could not be harvested.
#[derive(Debug)]
pub struct ChannelFailure {
    /// The channel as configured.
    pub channel: ChannelId,
    /// What went wrong.
    pub error: HarvestError,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Channels written, in processing order.
    pub completed: Vec<ChannelReport>,
    /// Channels skipped, in processing order.
    pub failed: Vec<ChannelFailure>,
}

impl RunSummary {
    /// Returns `true` if every channel was written.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total records written across channels.
    pub fn total_records(&self) -> usize {
        self.completed.iter().map(|r| r.records).sum()
    }

    /// Number of channels attempted.
    pub fn channels(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Fetches, projects and writes one channel.
///
/// All records are collected before the file is written, so a failure
/// part-way through history leaves any previous output untouched.
pub fn scrape_channel<S>(session: &mut S, channel: &ChannelId, settings: &Settings) -> Result<ChannelReport>
where
    S: HistorySession + ?Sized,
{
    scrape_channel_with_progress(session, channel, settings, None)
}

/// Like [`scrape_channel`], reporting each history page to `progress`.
pub fn scrape_channel_with_progress<S>(
    session: &mut S,
    channel: &ChannelId,
    settings: &Settings,
    progress: Option<ProgressCallback>,
) -> Result<ChannelReport>
where
    S: HistorySession + ?Sized,
{
    let mut history = fetch(
        session,
        channel,
        settings.window(),
        FetchOptions::from_settings(settings),
    )?;
    if let Some(callback) = progress {
        history = history.with_progress(callback);
    }
    let records = history
        .by_ref()
        .map(|msg| msg.map(|m| project(&m)))
        .collect::<Result<Vec<ProjectedRecord>>>()?;
    let pages = history.stats().pages;

    info!(records = records.len(), pages, "messages found within date range");
    let path = write_records(settings.output_dir(), channel, &records)?;
    info!(path = %path.display(), "saved channel output");

    Ok(ChannelReport {
        channel: channel.clone(),
        path,
        records: records.len(),
        pages,
    })
}

/// Harvests every configured channel in order.
///
/// # Errors
///
/// Returns the first fatal error; per-channel errors end up in
/// [`RunSummary::failed`] instead.
pub fn scrape_all<S>(session: &mut S, settings: &Settings) -> Result<RunSummary>
where
    S: HistorySession + ?Sized,
{
    scrape_all_with_progress(session, settings, None)
}

/// Like [`scrape_all`], reporting each history page of every channel to `progress`.
///
/// # Errors
///
/// Same as [`scrape_all`].
pub fn scrape_all_with_progress<S>(
    session: &mut S,
    settings: &Settings,
    progress: Option<ProgressCallback>,
) -> Result<RunSummary>
where
    S: HistorySession + ?Sized,
{
    let mut summary = RunSummary::default();
    info!(
        channels = settings.channels().len(),
        window = %settings.window(),
        backend = session.name(),
        "starting harvest"
    );

    for channel in settings.channels() {
        let _span = info_span!("channel", id = %channel).entered();
        match scrape_channel_with_progress(session, channel, settings, progress.clone()) {
            Ok(report) => summary.completed.push(report),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "skipping channel");
                summary.failed.push(ChannelFailure {
                    channel: channel.clone(),
                    error: e,
                });
            }
        }
    }

    info!(
        completed = summary.completed.len(),
        failed = summary.failed.len(),
        records = summary.total_records(),
        "harvest finished"
    );
    Ok(summary)
}
