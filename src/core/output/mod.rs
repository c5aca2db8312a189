//! Output files.
//!
//! Each channel gets one UTF-8 JSON array file, named after the channel:
//! `@rust_news` is written to `<dir>/rust_news_messages.json`. Records keep
//! the order the fetcher produced them in.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tgharvest::core::output::write_records;
//! use tgharvest::ChannelId;
//!
//! # fn main() -> tgharvest::Result<()> {
//! let path = write_records(Path::new("data"), &ChannelId::parse("@rust_news")?, &[])?;
//! assert!(path.ends_with("rust_news_messages.json"));
//! # Ok(())
//! # }
//! ```

mod json_writer;

use std::path::{Path, PathBuf};

use crate::channel::ChannelId;

pub use json_writer::{to_json, write_records};

/// Suffix appended to the channel's file stem.
pub const FILE_SUFFIX: &str = "_messages.json";

/// Path of the output file for `channel` inside `dir`.
pub fn output_path(dir: &Path, channel: &ChannelId) -> PathBuf {
    dir.join(format!("{}{FILE_SUFFIX}", channel.file_stem()))
}
