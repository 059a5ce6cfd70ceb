use events::EventPublisher;
use log::*;
use service::feed_log::{FeedCounterRenderer, FeedLog};
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use ws::{BroadcastHandler, Manager};

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
    }

    info!(
        "Starting up pg_press in {} mode [log level {}]",
        config.runtime_env(),
        config.log_level_filter
    );

    let feed_log = Arc::new(FeedLog::new());
    let feed_manager = Manager::new(
        config.ws_settings(),
        FeedCounterRenderer::new(Arc::clone(&feed_log), config.max_feeds_per_page),
    );
    let event_publisher = Arc::new(
        EventPublisher::new().with_handler(Arc::new(BroadcastHandler::new(feed_manager.clone()))),
    );

    let shutdown = CancellationToken::new();
    let manager_task = tokio::spawn({
        let feed_manager = feed_manager.clone();
        let shutdown = shutdown.clone();
        async move { feed_manager.start(shutdown).await }
    });

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down");
                    shutdown.cancel();
                }
                Err(e) => {
                    // Keep serving; the process can still be stopped externally.
                    error!("Unable to listen for shutdown signal: {e}");
                    std::future::pending::<()>().await;
                }
            }
        }
    });

    let app_state = AppState::new(config, feed_log, feed_manager, event_publisher);

    if let Err(e) = web::init_server(app_state, shutdown.clone()).await {
        error!("Server stopped with error: {e}");
    }
    shutdown.cancel();

    match manager_task.await {
        Ok(Ok(())) => info!("Feed manager stopped"),
        Ok(Err(e)) => error!("Feed manager failed: {e}"),
        Err(e) => error!("Feed manager task panicked: {e}"),
    }
}
