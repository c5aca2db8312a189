//! Core harvesting pipeline.
//!
//! This module contains:
//! - [`filter`] - Date parsing and the inclusive [`DateWindow`]
//! - [`fetcher`] - Lazy, date-bounded pagination over a session
//! - [`projector`] - Raw message to persisted record
//! - [`output`] - Per-channel JSON files
//! - [`processor`] - Channel loop tying the above together
//!
//! # Quick Start
//!
//! ```rust
//! use tgharvest::core::{DateWindow, FetchOptions, fetch, project};
//! ```

pub mod fetcher;
pub mod filter;
pub mod output;
pub mod processor;
pub mod projector;

pub use fetcher::{ChannelHistory, FetchOptions, FetchStats, ScanMode, fetch};
pub use filter::{DateWindow, WindowPosition, parse_date};
pub use output::{output_path, to_json, write_records};
pub use processor::{
    ChannelFailure, ChannelReport, RunSummary, scrape_all, scrape_all_with_progress, scrape_channel,
    scrape_channel_with_progress,
};
pub use projector::{ProjectedRecord, project};
