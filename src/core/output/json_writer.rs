//! JSON output writer.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::channel::ChannelId;
use crate::core::projector::ProjectedRecord;
use crate::error::{HarvestError, Result};

use super::output_path;

/// Writes a channel's records to `<dir>/<channel>_messages.json`.
///
/// Creates `dir` if needed and truncates any existing file. Returns the path
/// written.
///
/// # Format
/// ```json
/// [
///   {"id": 2, "date": "2024-01-15T10:30:00+00:00", "message": "Hi", ...},
///   {"id": 1, "date": "2024-01-14T08:00:00+00:00", "message": "", ...}
/// ]
/// ```
pub fn write_records(dir: &Path, channel: &ChannelId, records: &[ProjectedRecord]) -> Result<PathBuf> {
    let path = output_path(dir, channel);
    let json = to_json(records)?;

    fs::create_dir_all(dir).map_err(|e| HarvestError::output(dir, e))?;
    let mut file = File::create(&path).map_err(|e| HarvestError::output(&path, e))?;
    file.write_all(json.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .and_then(|()| file.sync_all())
        .map_err(|e| HarvestError::output(&path, e))?;

    Ok(path)
}

/// Converts records to a pretty-printed JSON array.
///
/// Same format as `write_records`, without touching the filesystem.
/// Non-ASCII text is written as-is.
pub fn to_json(records: &[ProjectedRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
