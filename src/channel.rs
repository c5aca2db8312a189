//! Channel identifiers.
//!
//! A channel is named either by its public handle (`@durov`, `durov`) or by
//! its numeric id (`-1001234567890`). [`ChannelId`] keeps the identifier
//! exactly as the user wrote it and derives everything else from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Identifier of a channel as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Validates and wraps a channel identifier.
    ///
    /// Surrounding whitespace is trimmed. The identifier must not be empty
    /// (a lone `@` counts as empty) and must not contain whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] for empty or malformed identifiers.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.trim_start_matches('@').is_empty() {
            return Err(HarvestError::config(format!(
                "channel identifier '{raw}' is empty"
            )));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(HarvestError::config(format!(
                "channel identifier '{raw}' contains whitespace"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier without a leading `@`.
    pub fn handle(&self) -> &str {
        self.0.strip_prefix('@').unwrap_or(&self.0)
    }

    /// The numeric id, if the identifier is one.
    pub fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// File-name-safe form of the identifier.
    ///
    /// Drops a leading `@` and replaces anything outside `[A-Za-z0-9_.-]`
    /// with `_`.
    pub fn file_stem(&self) -> String {
        self.handle()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelId {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = HarvestError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handle() {
        let id = ChannelId::parse("@durov").unwrap();
        assert_eq!(id.as_str(), "@durov");
        assert_eq!(id.handle(), "durov");
        assert!(id.numeric().is_none());
    }

    #[test]
    fn test_parse_numeric() {
        let id = ChannelId::parse(" -1001234567890 ").unwrap();
        assert_eq!(id.as_str(), "-1001234567890");
        assert_eq!(id.numeric(), Some(-1001234567890));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(ChannelId::parse("").is_err());
        assert!(ChannelId::parse("   ").is_err());
        assert!(ChannelId::parse("@").is_err());
    }

    #[test]
    fn test_parse_rejects_whitespace() {
        assert!(ChannelId::parse("two words").is_err());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(ChannelId::parse("@rust_news").unwrap().file_stem(), "rust_news");
        assert_eq!(ChannelId::parse("-100123").unwrap().file_stem(), "-100123");
        assert_eq!(ChannelId::parse("a/../b").unwrap().file_stem(), "a_.._b");
        assert_eq!(ChannelId::parse("канал").unwrap().file_stem(), "_____");
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let id: ChannelId = serde_json::from_str("\"@news\"").unwrap();
        assert_eq!(id.handle(), "news");
        assert!(serde_json::from_str::<ChannelId>("\"\"").is_err());
    }
}
