//! In-memory session.
//!
//! [`MemorySession`] serves feeds exactly in the order they were given,
//! which makes it the tool of choice for exercising the fetcher against
//! out-of-order feeds, inaccessible channels and mid-history failures
//! without any network or disk access.

use std::collections::HashMap;

use super::{ChannelHandle, HistoryPage, HistoryRequest, HistorySession, PageCursor};
use crate::channel::ChannelId;
use crate::error::{HarvestError, Result};
use crate::message::RawMessage;

#[derive(Debug, Clone)]
enum Feed {
    Messages {
        messages: Vec<RawMessage>,
        fail_at_page: Option<(usize, String)>,
    },
    Inaccessible(String),
}

/// A recorded history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Session key of the channel.
    pub channel: String,
    /// The request as received.
    pub request: HistoryRequest,
}

/// Session serving pre-loaded feeds from memory.
///
/// Channels are keyed by their handle, so `@news` and `news` name the same
/// feed. Cursors are positions into the feed. `offset_date` is recorded but
/// not applied: the feed is served verbatim.
#[derive(Debug, Clone)]
pub struct MemorySession {
    feeds: HashMap<String, Feed>,
    descending: bool,
    requests: Vec<RecordedRequest>,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    /// Creates an empty session that claims newest-first ordering.
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            descending: true,
            requests: Vec::new(),
        }
    }

    /// Adds a channel serving `messages` in the given order.
    #[must_use]
    pub fn with_channel(mut self, channel: &str, messages: Vec<RawMessage>) -> Self {
        self.feeds.insert(
            key_for(channel),
            Feed::Messages {
                messages,
                fail_at_page: None,
            },
        );
        self
    }

    /// Adds a channel that refuses access.
    #[must_use]
    pub fn with_inaccessible(mut self, channel: &str, reason: impl Into<String>) -> Self {
        self.feeds
            .insert(key_for(channel), Feed::Inaccessible(reason.into()));
        self
    }

    /// Makes the request for page `page` (0-based) of `channel` fail.
    #[must_use]
    pub fn failing_at_page(mut self, channel: &str, page: usize, message: impl Into<String>) -> Self {
        if let Some(Feed::Messages { fail_at_page, .. }) = self.feeds.get_mut(&key_for(channel)) {
            *fail_at_page = Some((page, message.into()));
        }
        self
    }

    /// Stops claiming newest-first ordering.
    #[must_use]
    pub fn unordered(mut self) -> Self {
        self.descending = false;
        self
    }

    /// Every history request received so far, in order.
    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    /// Number of history requests received for `channel`.
    pub fn page_requests(&self, channel: &str) -> usize {
        let key = key_for(channel);
        self.requests.iter().filter(|r| r.channel == key).count()
    }
}

fn key_for(channel: &str) -> String {
    channel.trim().trim_start_matches('@').to_string()
}

impl HistorySession for MemorySession {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn resolve(&mut self, channel: &ChannelId) -> Result<ChannelHandle> {
        let key = key_for(channel.as_str());
        match self.feeds.get(&key) {
            Some(Feed::Messages { .. }) => Ok(ChannelHandle::new(channel.clone(), key)),
            Some(Feed::Inaccessible(reason)) => {
                Err(HarvestError::channel_access(channel.as_str(), reason.clone()))
            }
            None => Err(HarvestError::channel_access(
                channel.as_str(),
                "channel does not exist",
            )),
        }
    }

    fn history_page(
        &mut self,
        channel: &ChannelHandle,
        request: &HistoryRequest,
    ) -> Result<HistoryPage> {
        let page_index = self
            .requests
            .iter()
            .filter(|r| r.channel == channel.key)
            .count();
        self.requests.push(RecordedRequest {
            channel: channel.key.clone(),
            request: *request,
        });

        let Some(Feed::Messages {
            messages,
            fail_at_page,
        }) = self.feeds.get(&channel.key)
        else {
            return Err(HarvestError::history(
                channel.requested.as_str(),
                "channel was not resolved",
            ));
        };

        if let Some((page, message)) = fail_at_page {
            if *page == page_index {
                return Err(HarvestError::history(channel.requested.as_str(), message.clone()));
            }
        }

        let start = request
            .cursor
            .map(|c| usize::try_from(c.token()).unwrap_or(usize::MAX))
            .unwrap_or(0)
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

    fn guarantees_descending(&self) -> bool {
        self.descending
    }
}
