//! Session backed by Telegram Desktop channel exports.
//!
//! Telegram Desktop's "Export chat history" writes a `result.json` per chat:
//!
//! ```json
//! {
//!   "name": "Rust News",
//!   "type": "public_channel",
//!   "id": 1234567890,
//!   "messages": [
//!     {
//!       "id": 12345,
//!       "type": "message",
//!       "date_unixtime": "1705314600",
//!       "text": "Hello" | ["Hello", {"type": "link", "text": "url"}],
//!       "views": 1200,
//!       "forwards": 4,
//!       "reactions": [{"type": "emoji", "count": 3, "emoji": "👍"}]
//!     }
//!   ]
//! }
//! ```
//!
//! The export session looks a channel up as `<export_dir>/<handle>.json` or
//! `<export_dir>/<handle>/result.json`, keeps only `"message"` entries, and
//! serves them newest-first in pages, the same way the platform's history
//! endpoint does.
//!
//! Messages are ordered by date, then id, both descending. Ids alone are not
//! enough: imported history gets fresh ids but keeps its original dates. The
//! page cursor is a position in that ordering, which stays fixed while the
//! channel is loaded. Only the most recently resolved channel is kept in
//! memory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{ChannelHandle, Credentials, HistoryPage, HistoryRequest, HistorySession, PageCursor};
use crate::channel::ChannelId;
use crate::error::{HarvestError, Result};
use crate::message::{RawMessage, ReactionCount, ReactionSummary};

/// Serves channel history from exported JSON files.
#[derive(Debug)]
pub struct ExportSession {
    root: PathBuf,
    account: Option<String>,
    current: Option<LoadedChannel>,
}

/// Messages of the resolved channel, newest first.
#[derive(Debug)]
struct LoadedChannel {
    key: String,
    messages: Vec<RawMessage>,
}

impl ExportSession {
    /// Opens a session over an export directory.
    ///
    /// Credentials are optional; when given, the masked phone number is used
    /// to label the session in logs.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Auth`] if `root` is not a readable directory.
    pub fn open(root: impl AsRef<Path>, credentials: Option<&Credentials>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(HarvestError::auth(format!(
                "export directory {} does not exist or is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
            account: credentials.map(Credentials::masked_phone),
            current: None,
        })
    }

    /// Directory the exports are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Label of the account the session was opened for.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    fn locate(&self, channel: &ChannelId) -> Option<PathBuf> {
        let handle = channel.handle();
        [
            self.root.join(format!("{handle}.json")),
            self.root.join(handle).join("result.json"),
        ]
        .into_iter()
        .find(|candidate| candidate.is_file())
    }
}

impl HistorySession for ExportSession {
    fn name(&self) -> &'static str {
        "telegram-export"
    }

    fn resolve(&mut self, channel: &ChannelId) -> Result<ChannelHandle> {
        self.current = None;

        // Path separators would let a handle escape the export directory.
        if channel.handle().contains(['/', '\\']) || channel.handle().starts_with('.') {
            return Err(HarvestError::channel_access(
                channel.as_str(),
                "identifier is not a valid channel handle",
            ));
        }

        let path = self.locate(channel).ok_or_else(|| {
            HarvestError::channel_access(
                channel.as_str(),
                format!("no export found in {}", self.root.display()),
            )
        })?;

        let export = read_export(&path).map_err(|e| {
            HarvestError::history(
                channel.as_str(),
                format!("cannot read {}: {e}", path.display()),
            )
        })?;

        let mut messages: Vec<RawMessage> = export
            .messages
            .iter()
            .filter_map(convert_message)
            .collect();
        messages.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        debug!(
            channel = %channel,
            path = %path.display(),
            messages = messages.len(),
            "loaded channel export"
        );

        let key = channel.handle().to_string();
        self.current = Some(LoadedChannel {
            key: key.clone(),
            messages,
        });

        let handle = ChannelHandle::new(channel.clone(), key);
        Ok(match export.name {
            Some(title) => handle.with_title(title),
            None => handle,
        })
    }

    fn history_page(
        &mut self,
        channel: &ChannelHandle,
        request: &HistoryRequest,
    ) -> Result<HistoryPage> {
        let messages = match &self.current {
            Some(loaded) if loaded.key == channel.key => &loaded.messages,
            _ => {
                return Err(HarvestError::history(
                    channel.requested.as_str(),
                    "channel was not resolved",
                ));
            }
        };

        // Everything at or after `offset_date` sits at the front.
        let newer = request
            .offset_date
            .map_or(0, |d| messages.partition_point(|m| m.date >= d));
        let start = request
            .cursor
            .map_or(0, |c| usize::try_from(c.token()).unwrap_or(usize::MAX))
            .max(newer)
            .min(messages.len());
        let end = start.saturating_add(request.limit.max(1)).min(messages.len());
        let page = messages[start..end].to_vec();

        Ok(if end < messages.len() {
            let token = i64::try_from(end).unwrap_or(i64::MAX);
            HistoryPage::with_next(page, PageCursor::new(token))
        } else {
            HistoryPage::last(page)
        })
    }
}

// Internal structures for deserializing Telegram Desktop exports

#[derive(Debug, Deserialize)]
struct ChannelExport {
    name: Option<String>,
    #[serde(default)]
    messages: Vec<ExportMessage>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    id: Option<i64>,
    #[serde(rename = "type")]
    msg_type: String,
    /// ISO local time, e.g. "2024-01-15T10:30:00"
    date: Option<String>,
    /// Unix timestamp as string
    date_unixtime: Option<String>,
    /// Message text (can be string or array)
    text: Option<Value>,
    views: Option<u64>,
    forwards: Option<u64>,
    #[serde(default)]
    reactions: Vec<ExportReaction>,
}

#[derive(Debug, Deserialize)]
struct ExportReaction {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    count: u64,
    emoji: Option<String>,
    document_id: Option<String>,
}

fn read_export(path: &Path) -> Result<ChannelExport> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn convert_message(msg: &ExportMessage) -> Option<RawMessage> {
    if msg.msg_type != "message" {
        return None;
    }
    let id = msg.id?;
    let date = msg
        .date_unixtime
        .as_deref()
        .and_then(parse_unix_timestamp)
        .or_else(|| msg.date.as_deref().and_then(parse_local_timestamp))?;

    let text = msg
        .text
        .as_ref()
        .map(extract_text)
        .filter(|t| !t.is_empty());

    let reactions = (!msg.reactions.is_empty()).then(|| ReactionSummary {
        results: msg.reactions.iter().map(convert_reaction).collect(),
    });

    Some(RawMessage {
        id,
        date,
        text,
        views: msg.views,
        forwards: msg.forwards,
        reactions,
    })
}

fn convert_reaction(reaction: &ExportReaction) -> ReactionCount {
    let emoji = match (&reaction.emoji, &reaction.document_id) {
        (Some(emoji), _) => emoji.clone(),
        (None, Some(doc)) => format!("custom:{doc}"),
        (None, None) => reaction.kind.clone().unwrap_or_else(|| "unknown".to_string()),
    };
    ReactionCount {
        emoji,
        count: reaction.count,
    }
}

/// Extracts text content from Telegram's `text` field.
///
/// The field can be:
/// - A simple string: `"Hello"`
/// - An array with strings and objects: `["Text", {"type": "link", "text": "url"}]`
fn extract_text(text_value: &Value) -> String {
    match text_value {
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("text")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string),
                _ => None,
            })
            .collect::<String>(),
        _ => String::new(),
    }
}

/// Telegram stores timestamps as strings like "1234567890".
fn parse_unix_timestamp(ts_str: &str) -> Option<DateTime<Utc>> {
    ts_str
        .parse::<i64>()
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

/// Older exports only carry `date`; it is read as UTC.
fn parse_local_timestamp(ts_str: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(ts_str, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}
