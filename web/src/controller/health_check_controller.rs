use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use service::AppState;

/// GET liveness of the API router, including how many feed sockets are open
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API router is up and responding to requests", body = String),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        format!(
            "healthy ({} feed connections)",
            app_state.feed_manager.connection_count()
        ),
    )
}
