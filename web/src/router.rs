use crate::controller::{feed_controller, health_check_controller};
use crate::websocket::handler as websocket_handler;
use axum::{
    routing::{delete, get},
    Router,
};
use service::AppState;

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Press Feed API"
        ),
        paths(
            feed_controller::index,
            feed_controller::create,
            feed_controller::delete,
            health_check_controller::health_check,
            websocket_handler::feed_socket,
        ),
        components(
            schemas(
                service::feed_log::Feed,
                service::feed_log::NewFeed,
            )
        ),
        tags(
            (name = "pg_press", description = "Press activity feed with live unread counters")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(feed_routes(app_state.clone()))
        .merge(feed_socket_routes(app_state.clone()))
        .merge(health_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn feed_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/feeds",
            get(feed_controller::index).post(feed_controller::create),
        )
        .route("/feeds/{id}", delete(feed_controller::delete))
        .with_state(app_state)
}

fn feed_socket_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws/feed", get(websocket_handler::feed_socket))
        .with_state(app_state)
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use events::EventPublisher;
    use serde_json::{json, Value};
    use service::config::Config;
    use service::feed_log::{FeedCounterRenderer, FeedLog};
    use std::sync::Arc;
    use tower::ServiceExt;
    use ws::{BroadcastHandler, Manager};

    fn app_state() -> AppState {
        let config = Config::try_parse_from(["pg_press"]).unwrap();
        let feed_log = Arc::new(FeedLog::new());
        let manager = Manager::new(
            config.ws_settings(),
            FeedCounterRenderer::new(Arc::clone(&feed_log), config.max_feeds_per_page),
        );
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(BroadcastHandler::new(manager.clone())));

        AppState::new(config, feed_log, manager, Arc::new(publisher))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_feed(body: Value) -> Request<Body> {
        Request::post("/feeds")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_connection_count() {
        let router = define_routes(app_state());

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"healthy (0 feed connections)");
    }

    #[tokio::test]
    async fn test_create_then_index_returns_newest_first() {
        let state = app_state();
        let router = define_routes(state.clone());

        for title in ["Tool 4 mounted", "Press 2 cycles reset"] {
            let response = router
                .clone()
                .oneshot(post_feed(json!({"title": title, "user_id": 1})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = router
            .oneshot(Request::get("/feeds?limit=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], 2);
        assert_eq!(data[0]["title"], "Press 2 cycles reset");
        assert_eq!(state.feed_log.len(), 2);
    }

    #[tokio::test]
    async fn test_create_with_blank_title_is_unprocessable() {
        let router = define_routes(app_state());

        let response = router
            .oneshot(post_feed(json!({"title": "  ", "user_id": 1})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_missing_feed_is_not_found() {
        let router = define_routes(app_state());

        let response = router
            .oneshot(Request::delete("/feeds/41").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
