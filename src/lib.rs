//! # tgharvest
//!
//! Harvests the message history of public Telegram channels within a date
//! window and stores one JSON file per channel.
//!
//! ## Overview
//!
//! A run is described by a YAML config file (channels, start/end dates,
//! output directory), optionally overridden from the command line. For each
//! channel the harvester:
//!
//! 1. resolves it through a [`HistorySession`](session::HistorySession)
//! 2. pages through its history newest-first, keeping messages whose UTC
//!    date falls inside the window and stopping at the first older one
//! 3. projects each message onto a fixed record shape
//! 4. writes the records to `<output_dir>/<channel>_messages.json`
//!
//! A channel that cannot be read is logged and skipped; the others still run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tgharvest::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let settings = ConfigFile::load("config.yaml")?.resolve(&Overrides::default())?;
//!     let mut session = ExportSession::open("exports", None)?;
//!
//!     let summary = scrape_all(&mut session, &settings)?;
//!     println!("{} records written", summary.total_records());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`config`] - YAML config and command-line overrides
//!   - [`ConfigFile`](config::ConfigFile), [`Overrides`](config::Overrides), [`Settings`](config::Settings)
//! - [`session`] - The [`HistorySession`](session::HistorySession) trait and its backends
//! - [`core`] - Fetching, projection, output and the channel loop
//!   - [`core::filter`] - [`DateWindow`](core::DateWindow)
//!   - [`core::fetcher`] - [`fetch`](core::fetch)
//!   - [`core::projector`] - [`ProjectedRecord`]
//!   - [`core::output`] - [`write_records`](core::write_records)
//!   - [`core::processor`] - [`scrape_all`](core::scrape_all)
//! - [`channel`] - [`ChannelId`]
//! - [`message`] - [`RawMessage`]
//! - [`progress`] - Per-page [`ProgressCallback`](progress::ProgressCallback)
//! - [`error`] - [`HarvestError`], [`Result`]
//! - [`prelude`] - Convenient re-exports

pub mod channel;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod message;
pub mod progress;
pub mod session;

pub use channel::ChannelId;
pub use crate::core::projector::ProjectedRecord;
pub use error::{HarvestError, Result};
pub use message::RawMessage;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use tgharvest::prelude::*;
/// ```
pub mod prelude {
    pub use crate::channel::ChannelId;
    pub use crate::error::{HarvestError, Result};
    pub use crate::message::{RawMessage, ReactionSummary};

    pub use crate::config::{ConfigFile, Overrides, SessionSettings, Settings};

    pub use crate::session::{Credentials, ExportSession, HistorySession, MemorySession};

    pub use crate::core::filter::DateWindow;
    pub use crate::core::processor::{
        RunSummary, scrape_all, scrape_all_with_progress, scrape_channel, scrape_channel_with_progress,
    };
    pub use crate::progress::{Progress, ProgressCallback};
    pub use crate::core::projector::{ProjectedRecord, project};
}
