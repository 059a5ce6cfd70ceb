//! Event system infrastructure for the press tooling application.
//!
//! This crate decouples the code that commits changes (the content producer)
//! from the infrastructure that reacts to them, such as the realtime feed
//! counter pushed over WebSocket.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing the business events other layers react to
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates, avoiding circular dependencies.

use async_trait::async_trait;
use std::sync::Arc;

/// Identifier of a feed entry. Feed ids grow monotonically, so they double as
/// the "last seen" marker clients report when connecting.
pub type FeedId = i64;

/// Domain events that represent committed changes in the system.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// Emitted after a feed entry (tool change, cycle, trouble report, ...) was stored.
    /// Triggers a feed counter refresh for every connected client.
    FeedCreated {
        feed_id: FeedId,
        /// Human readable title, carried for logging only.
        title: String,
    },
    /// Emitted after a feed entry was removed. Unread counts may shrink.
    FeedDeleted { feed_id: FeedId },
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers, one after another.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
