use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;

/// Turns committed feed changes into a refresh for every connected client.
///
/// The event payload is only logged; clients re-render from current state, so
/// all the manager needs to know is that something changed.
pub struct BroadcastHandler {
    manager: Manager,
}

impl BroadcastHandler {
    pub fn new(manager: Manager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl EventHandler for BroadcastHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::FeedCreated { feed_id, title } => {
                debug!("Handling FeedCreated event for feed {} ({})", feed_id, title);
            }
            DomainEvent::FeedDeleted { feed_id } => {
                debug!("Handling FeedDeleted event for feed {}", feed_id);
            }
        }

        self.manager.broadcast();
    }
}
