//! Raw channel messages as handed out by a session.
//!
//! [`RawMessage`] is the record a [`HistorySession`](crate::session::HistorySession)
//! produces for every post in a channel's history. It is read-only from the
//! harvester's point of view: the fetcher filters it, the projector reshapes
//! it, nothing mutates it.
//!
//! # Examples
//!
//! ```
//! use tgharvest::RawMessage;
//! use chrono::{TimeZone, Utc};
//!
//! let msg = RawMessage::new(42, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
//!     .with_text("Release notes are out")
//!     .with_views(1_250)
//!     .with_reaction("👍", 17);
//!
//! assert_eq!(msg.id, 42);
//! assert_eq!(msg.reactions.unwrap().total(), 17);
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single message from a channel's history.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `id` | `i64` | Message id, unique within the channel |
/// | `date` | `DateTime<Utc>` | When the message was posted |
/// | `text` | `Option<String>` | Text or caption, absent for bare media |
/// | `views` | `Option<u64>` | View counter, if the platform reports it |
/// | `forwards` | `Option<u64>` | Forward counter, if the platform reports it |
/// | `reactions` | `Option<ReactionSummary>` | Reaction tallies, if any |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message id, unique within the channel.
    pub id: i64,

    /// When the message was posted.
    pub date: DateTime<Utc>,

    /// Text or caption of the message.
    #[serde(default)]
    pub text: Option<String>,

    /// Number of views.
    #[serde(default)]
    pub views: Option<u64>,

    /// Number of forwards.
    #[serde(default)]
    pub forwards: Option<u64>,

    /// Reaction tallies.
    #[serde(default)]
    pub reactions: Option<ReactionSummary>,
}

impl RawMessage {
    /// Creates a message with only an id and a date.
    pub fn new(id: i64, date: DateTime<Utc>) -> Self {
        Self {
            id,
            date,
            text: None,
            views: None,
            forwards: None,
            reactions: None,
        }
    }

    /// Sets the message text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the view counter.
    #[must_use]
    pub fn with_views(mut self, views: u64) -> Self {
        self.views = Some(views);
        self
    }

    /// Sets the forward counter.
    #[must_use]
    pub fn with_forwards(mut self, forwards: u64) -> Self {
        self.forwards = Some(forwards);
        self
    }

    /// Adds one reaction tally, creating the summary if needed.
    #[must_use]
    pub fn with_reaction(mut self, emoji: impl Into<String>, count: u64) -> Self {
        self.reactions
            .get_or_insert_with(ReactionSummary::default)
            .results
            .push(ReactionCount {
                emoji: emoji.into(),
                count,
            });
        self
    }

    /// Replaces the reaction summary.
    #[must_use]
    pub fn with_reactions(mut self, reactions: ReactionSummary) -> Self {
        self.reactions = Some(reactions);
        self
    }

    /// Calendar date (UTC) the message was posted on.
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Reaction tallies attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    /// One entry per distinct reaction.
    pub results: Vec<ReactionCount>,
}

impl ReactionSummary {
    /// Sum of all reaction counts.
    pub fn total(&self) -> u64 {
        self.results.iter().map(|r| r.count).sum()
    }

    /// Returns `true` if no reaction has been recorded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// How many times one reaction was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    /// The emoji, or a placeholder such as `custom:<id>` for custom emoji.
    pub emoji: String,
    /// Number of users who reacted with it.
    pub count: u64,
}
