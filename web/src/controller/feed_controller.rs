use crate::controller::ApiResponse;
use crate::params::feed::IndexParams;
use crate::Error;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use events::{DomainEvent, FeedId};
use service::feed_log::NewFeed;
use service::AppState;

use log::*;

/// GET the newest feed entries, newest first.
#[utoipa::path(
    get,
    path = "/feeds",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved feed entries", body = [service::feed_log::Feed]),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Feeds with params: {params:?}");

    let limit = params.capped_limit(app_state.config.max_feeds_per_page);
    let feeds = app_state.feed_log_ref().list_range(params.offset, limit);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), feeds)))
}

/// POST append a new feed entry and notify every connected client.
#[utoipa::path(
    post,
    path = "/feeds",
    request_body = service::feed_log::NewFeed,
    responses(
        (status = 201, description = "Successfully appended a new feed entry", body = service::feed_log::Feed),
        (status = 422, description = "Unprocessable Entity"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(new_feed): Json<NewFeed>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new Feed from: {new_feed:?}");

    let feed = app_state.feed_log_ref().append(new_feed)?;

    debug!("New Feed: {feed:?}");

    app_state
        .event_publisher
        .publish(DomainEvent::FeedCreated {
            feed_id: feed.id,
            title: feed.title.clone(),
        })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), feed)),
    ))
}

/// DELETE a feed entry specified by its id.
#[utoipa::path(
    delete,
    path = "/feeds/{id}",
    params(
        ("id" = i64, Path, description = "Feed id to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the feed entry", body = service::feed_log::Feed),
        (status = 404, description = "Feed not found"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Path(id): Path<FeedId>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Feed by id: {id}");

    let feed = app_state.feed_log_ref().delete(id)?;

    app_state
        .event_publisher
        .publish(DomainEvent::FeedDeleted { feed_id: feed.id })
        .await;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), feed)))
}
