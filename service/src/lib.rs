use config::Config;
use events::EventPublisher;
use feed_log::FeedLog;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod feed_log;
pub mod logging;

// Service-level state shared by every request handler
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub feed_log: Arc<FeedLog>,
    pub feed_manager: ws::Manager,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(
        app_config: Config,
        feed_log: Arc<FeedLog>,
        feed_manager: ws::Manager,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config: app_config,
            feed_log,
            feed_manager,
            event_publisher,
        }
    }

    pub fn feed_log_ref(&self) -> &FeedLog {
        self.feed_log.as_ref()
    }
}
