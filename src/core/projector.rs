//! Projection of raw messages onto the persisted record shape.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{RawMessage, ReactionSummary};

/// The fields persisted for each message.
///
/// Every key is always serialized; absent values become `null` (or `""` for
/// the message text), never a missing key.
///
/// ```json
/// {
///   "id": 42,
///   "date": "2024-01-15T10:30:00+00:00",
///   "message": "Release notes are out",
///   "views": 1250,
///   "forwards": null,
///   "reactions": {"count": 17, "reactions": [{"emoji": "👍", "count": 17}]}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedRecord {
    /// Message id within the channel.
    pub id: i64,
    /// Posting time, RFC 3339 in UTC.
    pub date: String,
    /// Text or caption; empty when the message has none.
    pub message: String,
    /// View counter, if reported.
    pub views: Option<u64>,
    /// Forward counter, if reported.
    pub forwards: Option<u64>,
    /// Reaction tallies, if any.
    pub reactions: Option<ProjectedReactions>,
}

/// Reaction tallies with their grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedReactions {
    /// Sum of all reaction counts.
    pub count: u64,
    /// One entry per distinct reaction, in platform order.
    pub reactions: Vec<ProjectedReaction>,
}

/// A single reaction and how often it was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedReaction {
    /// The emoji, or `custom:<id>` for custom emoji.
    pub emoji: String,
    /// Number of uses.
    pub count: u64,
}

/// Projects a message. Pure and total.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tgharvest::core::project;
/// use tgharvest::RawMessage;
///
/// let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
/// let record = project(&RawMessage::new(7, at).with_reaction("👍", 2));
/// assert_eq!(record.date, "2024-01-15T10:30:00+00:00");
/// assert_eq!(record.message, "");
/// assert_eq!(record.reactions.map(|r| r.count), Some(2));
/// ```
pub fn project(msg: &RawMessage) -> ProjectedRecord {
    ProjectedRecord {
        id: msg.id,
        date: format_date(&msg.date),
        message: msg.text.clone().unwrap_or_default(),
        views: msg.views,
        forwards: msg.forwards,
        reactions: msg.reactions.as_ref().and_then(project_reactions),
    }
}

/// ISO-8601 with second precision and an explicit `+00:00` offset.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn project_reactions(summary: &ReactionSummary) -> Option<ProjectedReactions> {
    if summary.is_empty() {
        return None;
    }
    Some(ProjectedReactions {
        count: summary.total(),
        reactions: summary
            .results
            .iter()
            .map(|r| ProjectedReaction {
                emoji: r.emoji.clone(),
                count: r.count,
            })
            .collect(),
    })
}

impl From<&RawMessage> for ProjectedRecord {
    fn from(msg: &RawMessage) -> Self {
        project(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_absent_optionals_serialize_as_null() {
        let record = project(&RawMessage::new(1, ts()).with_forwards(5));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "date": "2024-01-15T10:30:00+00:00",
                "message": "",
                "views": null,
                "forwards": 5,
                "reactions": null
            })
        );
    }

    #[test]
    fn test_key_order() {
        let record = project(&RawMessage::new(1, ts()));
        let text = serde_json::to_string(&record).unwrap();
        let positions: Vec<usize> = ["\"id\"", "\"date\"", "\"message\"", "\"views\"", "\"forwards\"", "\"reactions\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_reactions_projection() {
        let msg = RawMessage::new(9, ts())
            .with_text("hi")
            .with_views(100)
            .with_reaction("👍", 3)
            .with_reaction("🔥", 2);
        let record = project(&msg);
        let reactions = record.reactions.unwrap();
        assert_eq!(reactions.count, 5);
        assert_eq!(reactions.reactions[1].emoji, "🔥");
        assert_eq!(record.message, "hi");
        assert_eq!(record.views, Some(100));
    }

    #[test]
    fn test_empty_reaction_summary_is_null() {
        let msg = RawMessage::new(1, ts()).with_reactions(ReactionSummary::default());
        assert!(project(&msg).reactions.is_none());
    }

    #[test]
    fn test_date_keeps_seconds_and_offset() {
        let with_nanos = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(format_date(&with_nanos), "2024-01-15T10:30:05+00:00");
    }

    #[test]
    fn test_from_impl_matches_project() {
        let msg = RawMessage::new(3, ts()).with_text("x");
        assert_eq!(ProjectedRecord::from(&msg), project(&msg));
    }
}
