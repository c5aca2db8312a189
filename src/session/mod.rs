//! Sessions: the authenticated handle to a channel's history.
//!
//! The harvester never talks to the platform directly. Everything it needs
//! from the remote side goes through the [`HistorySession`] trait, which
//! exposes two capabilities:
//!
//! - resolve a [`ChannelId`] into a [`ChannelHandle`] (or refuse access)
//! - serve one [`HistoryPage`] of messages for a [`HistoryRequest`]
//!
//! Transport, authentication and rate limiting are the implementor's
//! business. Pagination state is an opaque [`PageCursor`] that the session
//! hands out and the fetcher hands back.
//!
//! # Implementations
//!
//! - [`ExportSession`] - serves Telegram Desktop channel exports from disk
//! - [`MemorySession`] - in-memory feed for tests and embedding
//!
//! # Example
//!
//! ```rust
//! use tgharvest::session::{HistoryRequest, HistorySession, MemorySession};
//! use tgharvest::{ChannelId, RawMessage};
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> tgharvest::Result<()> {
//! let ts = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
//! let mut session = MemorySession::new()
//!     .with_channel("@news", vec![RawMessage::new(2, ts), RawMessage::new(1, ts)]);
//!
//! let channel = session.resolve(&ChannelId::parse("@news")?)?;
//! let page = session.history_page(&channel, &HistoryRequest::first(10))?;
//! assert_eq!(page.messages.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod export;
pub mod memory;

pub use credentials::Credentials;
pub use export::ExportSession;
pub use memory::MemorySession;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::channel::ChannelId;
use crate::config::SessionSettings;
use crate::error::Result;
use crate::message::RawMessage;

/// Opaque continuation token for the next history page.
///
/// Its meaning is defined by the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageCursor(i64);

impl PageCursor {
    /// Wraps a raw token.
    pub fn new(token: i64) -> Self {
        Self(token)
    }

    /// The raw token.
    pub fn token(self) -> i64 {
        self.0
    }
}

/// A channel the session has agreed to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    /// The identifier the caller asked for.
    pub requested: ChannelId,
    /// Session-specific key used for subsequent requests.
    pub key: String,
    /// Human-readable channel title, if known.
    pub title: Option<String>,
}

impl ChannelHandle {
    /// Creates a handle with no title.
    pub fn new(requested: ChannelId, key: impl Into<String>) -> Self {
        Self {
            requested,
            key: key.into(),
            title: None,
        }
    }

    /// Sets the channel title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Parameters of one history page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Continuation from the previous page; `None` for the first page.
    pub cursor: Option<PageCursor>,
    /// Only messages strictly older than this instant, if set.
    pub offset_date: Option<DateTime<Utc>>,
    /// Maximum number of messages to return.
    pub limit: usize,
}

impl HistoryRequest {
    /// Request for the newest page.
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: None,
            offset_date: None,
            limit,
        }
    }

    /// Sets the offset date.
    #[must_use]
    pub fn with_offset_date(mut self, offset_date: Option<DateTime<Utc>>) -> Self {
        self.offset_date = offset_date;
        self
    }

    /// Request for the page following `cursor`, keeping the other parameters.
    #[must_use]
    pub fn continue_from(self, cursor: PageCursor) -> Self {
        Self {
            cursor: Some(cursor),
            ..self
        }
    }
}

/// One page of history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    /// Messages in feed order.
    pub messages: Vec<RawMessage>,
    /// Cursor for the next page; `None` when history is exhausted.
    pub next: Option<PageCursor>,
}

impl HistoryPage {
    /// A final page.
    pub fn last(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            next: None,
        }
    }

    /// A page with more history behind it.
    pub fn with_next(messages: Vec<RawMessage>, next: PageCursor) -> Self {
        Self {
            messages,
            next: Some(next),
        }
    }
}

/// Access to the message history of channels.
///
/// Implementors own transport, authentication and rate limiting. All methods
/// take `&mut self` so network-backed sessions can keep connection state.
pub trait HistorySession {
    /// Human-readable name of the backend.
    fn name(&self) -> &'static str;

    /// Resolves a channel identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ChannelAccess`](crate::HarvestError::ChannelAccess)
    /// when the channel does not exist or may not be read.
    fn resolve(&mut self, channel: &ChannelId) -> Result<ChannelHandle>;

    /// Fetches one page of history for a resolved channel.
    fn history_page(
        &mut self,
        channel: &ChannelHandle,
        request: &HistoryRequest,
    ) -> Result<HistoryPage>;

    /// Whether pages come strictly newest-first.
    ///
    /// When `false`, the fetcher scans the whole history instead of stopping
    /// at the first message older than the window.
    fn guarantees_descending(&self) -> bool {
        true
    }
}

impl<S: HistorySession + ?Sized> HistorySession for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resolve(&mut self, channel: &ChannelId) -> Result<ChannelHandle> {
        (**self).resolve(channel)
    }

    fn history_page(
        &mut self,
        channel: &ChannelHandle,
        request: &HistoryRequest,
    ) -> Result<HistoryPage> {
        (**self).history_page(channel, request)
    }

    fn guarantees_descending(&self) -> bool {
        (**self).guarantees_descending()
    }
}

/// Opens the session configured for this run.
///
/// # Errors
///
/// Returns [`HarvestError::Auth`](crate::HarvestError::Auth) when the session
/// cannot be established.
pub fn open(
    settings: &SessionSettings,
    credentials: Option<&Credentials>,
) -> Result<Box<dyn HistorySession>> {
    let session = ExportSession::open(&settings.export_dir, credentials)?;
    info!(
        backend = session.name(),
        account = session.account().unwrap_or("anonymous"),
        "session opened"
    );
    Ok(Box::new(session))
}
