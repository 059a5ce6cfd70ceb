use crate::params::feed::ConnectParams;
use crate::websocket::socket::AxumTransport;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use log::*;
use service::AppState;
use tokio::time::Instant;

/// GET upgrade to the feed counter WebSocket.
///
/// The client receives its unread counter right away and a fresh one after
/// every feed change until the socket closes.
#[utoipa::path(
    get,
    path = "/ws/feed",
    params(ConnectParams),
    responses(
        (status = 101, description = "Switching to the feed counter WebSocket"),
        (status = 400, description = "Missing or malformed query parameters")
    )
)]
pub(crate) async fn feed_socket(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> impl IntoResponse {
    debug!(
        "Feed WebSocket upgrade for user {} (last feed {})",
        params.user_id, params.last_feed
    );

    ws.on_upgrade(move |socket| serve_feed_socket(socket, app_state, params))
}

async fn serve_feed_socket(socket: WebSocket, app_state: AppState, params: ConnectParams) {
    let started = Instant::now();
    let connection = match app_state
        .feed_manager
        .register_connection(
            params.user_id.to_string(),
            params.last_feed,
            AxumTransport::new(socket),
        )
        .await
    {
        Ok(connection) => connection,
        Err(e) => {
            warn!("Rejected feed WebSocket for user {}: {e}", params.user_id);
            return;
        }
    };

    connection.closed().await;

    info!(
        "Feed WebSocket {} for user {} closed after {:?}",
        connection.id(),
        connection.client_id(),
        started.elapsed()
    );
}
