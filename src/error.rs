//! Unified error types for tgharvest.
//!
//! This module provides a single [`HarvestError`] enum that covers every
//! failure the harvester can run into, from a broken config file to a channel
//! that refuses access halfway through a run.
//!
//! # Fatal vs. per-channel errors
//!
//! - **Fatal** errors ([`Config`](HarvestError::Config),
//!   [`InvalidDate`](HarvestError::InvalidDate), [`Auth`](HarvestError::Auth))
//!   stop the run before (or while) any channel is processed.
//! - **Per-channel** errors (everything else) are logged against the channel
//!   and the run moves on to the next one.
//!
//! Use [`HarvestError::is_fatal`] to tell them apart.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for tgharvest operations.
///
/// # Example
///
/// ```rust
/// use tgharvest::error::Result;
/// use tgharvest::ProjectedRecord;
///
/// fn my_function() -> Result<Vec<ProjectedRecord>> {
///     // ... operations that may fail
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, HarvestError>;

/// The error type for all tgharvest operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HarvestError {
    /// The configuration is missing, malformed, or incomplete.
    #[error("Config error{}: {message}", path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    Config {
        /// What is wrong with the configuration
        message: String,
        /// The config file, if the problem came from one
        path: Option<PathBuf>,
    },

    /// A date in the configuration or on the command line could not be parsed.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// The session could not be opened or authenticated.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A channel is private, banned, or does not exist.
    #[error("Cannot access channel '{channel}': {reason}")]
    ChannelAccess {
        /// The channel identifier as configured
        channel: String,
        /// Why the session refused it
        reason: String,
    },

    /// A history page request failed after the channel was resolved.
    #[error("Failed to fetch history of '{channel}': {message}")]
    History {
        /// The channel identifier as configured
        channel: String,
        /// Description of the failure
        message: String,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Writing an output file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Output {
        /// The file being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// JSON parsing/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl HarvestError {
    /// Creates a configuration error without a file path.
    pub fn config(message: impl Into<String>) -> Self {
        HarvestError::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Creates a configuration error tied to a config file.
    pub fn config_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        HarvestError::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        HarvestError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        HarvestError::Auth(message.into())
    }

    /// Creates a channel access error.
    pub fn channel_access(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        HarvestError::ChannelAccess {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    /// Creates a history fetch error.
    pub fn history(channel: impl Into<String>, message: impl Into<String>) -> Self {
        HarvestError::History {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Creates an output error for the given file.
    pub fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarvestError::Output {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this error must abort the whole run.
    ///
    /// Configuration and authentication problems are fatal; everything else
    /// only affects the channel being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarvestError::Config { .. } | HarvestError::InvalidDate { .. } | HarvestError::Auth(_)
        )
    }

    /// Returns `true` if this is a configuration error (including bad dates).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            HarvestError::Config { .. } | HarvestError::InvalidDate { .. }
        )
    }

    /// Returns `true` if this is an authentication error.
    pub fn is_auth(&self) -> bool {
        matches!(self, HarvestError::Auth(_))
    }

    /// Returns `true` if this is a channel access error.
    pub fn is_channel_access(&self) -> bool {
        matches!(self, HarvestError::ChannelAccess { .. })
    }

    /// Returns `true` if this is an I/O error, including output failures.
    pub fn is_io(&self) -> bool {
        matches!(self, HarvestError::Io(_) | HarvestError::Output { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
