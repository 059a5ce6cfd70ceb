use axum::http::{header, HeaderValue, Method};
use log::*;
use service::AppState;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod params;
pub mod router;
mod websocket;

pub use error::{Error, Result};

pub async fn init_server(
    app_state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let interface = app_state.config.interface().to_string();
    let port = app_state.config.port;
    let origins = allowed_origins(&app_state.config.allowed_origins);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .allow_origin(origins);

    let app = router::define_routes(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("{interface}:{port}")).await?;
    info!("Server starting... listening for connections on http://{interface}:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

fn allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect()
}
