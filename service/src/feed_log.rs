use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use events::FeedId;
use log::*;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use utoipa::ToSchema;
use ws::{Marker, Render, RenderError};

/// One entry of the activity feed shown to every signed in user.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Feed {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Request body for appending a feed entry.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewFeed {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub user_id: i64,
}

#[derive(Default)]
struct Entries {
    // Ascending by id; ids are handed out in insertion order.
    feeds: Vec<Feed>,
    last_id: FeedId,
}

/// Append-only (apart from deletes) log of feed entries.
#[derive(Default)]
pub struct FeedLog {
    entries: RwLock<Entries>,
}

impl FeedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, new_feed: NewFeed) -> Result<Feed, Error> {
        let title = new_feed.title.trim();
        if title.is_empty() {
            return Err(Error::validation("feed title must not be blank"));
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.last_id += 1;
        let feed = Feed {
            id: entries.last_id,
            title: title.to_string(),
            content: new_feed.content,
            user_id: new_feed.user_id,
            created_at: Utc::now(),
        };
        entries.feeds.push(feed.clone());

        debug!("Appended feed {} for user {}", feed.id, feed.user_id);
        Ok(feed)
    }

    /// Newest first, skipping `offset` entries.
    pub fn list_range(&self, offset: usize, limit: usize) -> Vec<Feed> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .feeds
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn delete(&self, id: FeedId) -> Result<Feed, Error> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let position = entries
            .feeds
            .binary_search_by_key(&id, |feed| feed.id)
            .map_err(|_| Error::not_found(format!("feed {id} does not exist")))?;

        Ok(entries.feeds.remove(position))
    }

    pub fn latest_id(&self) -> Option<FeedId> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.feeds.last().map(|feed| feed.id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .feeds
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries newer than `last_feed` among the newest `window`.
    /// Counting stops at the first entry the reader has already seen.
    pub fn unread_count(&self, last_feed: FeedId, window: usize) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .feeds
            .iter()
            .rev()
            .take(window)
            .take_while(|feed| feed.id > last_feed)
            .count()
    }
}

/// Renders the unread counter badge pushed to every connected client.
pub struct FeedCounterRenderer {
    feed_log: Arc<FeedLog>,
    window: usize,
}

impl FeedCounterRenderer {
    pub fn new(feed_log: Arc<FeedLog>, window: usize) -> Self {
        Self { feed_log, window }
    }

    fn fragment(count: usize) -> String {
        format!(
            r#"<span id="feed-counter" hx-swap-oob="true" data-count="{count}">{count}</span>"#
        )
    }
}

#[async_trait]
impl Render for FeedCounterRenderer {
    async fn render(&self, last_marker: Marker) -> Result<Vec<u8>, RenderError> {
        let count = self.feed_log.unread_count(last_marker, self.window);
        trace!("Rendering feed counter {count} for last feed {last_marker}");
        Ok(Self::fragment(count).into_bytes())
    }
}
