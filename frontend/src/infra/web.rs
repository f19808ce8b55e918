use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::core::feed::{FeedApi, FeedError};
use crate::core::pages::{load_channel, load_home};

type SharedFeed = Arc<dyn FeedApi>;

// ── Server bootstrap ─────────────────────────────────────────

pub fn router(feed: SharedFeed) -> Router {
    Router::new()
        .route("/api/pages/home", get(home_page))
        .route("/api/pages/channel/{id}", get(channel_page))
        .with_state(feed)
        .layer(tower_http::cors::CorsLayer::permissive())
}

pub async fn start_server(feed: SharedFeed, port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Page data server listening");
    axum::serve(listener, router(feed)).await
}

// ── GET /api/pages/home ──────────────────────────────────────

async fn home_page(State(feed): State<SharedFeed>, headers: HeaderMap) -> Response {
    // The server only ever sees plain http; root_url upgrades it.
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let origin = format!("http://{host}");

    // reqwest::blocking must stay off the async workers.
    let result = tokio::task::spawn_blocking(move || load_home(feed.as_ref(), &origin)).await;

    match result {
        Ok(Ok(page)) => Json(page).into_response(),
        Ok(Err(e)) => feed_error_response(e),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// ── GET /api/pages/channel/:id ───────────────────────────────

async fn channel_page(State(feed): State<SharedFeed>, Path(id): Path<String>) -> Response {
    let result = tokio::task::spawn_blocking(move || load_channel(feed.as_ref(), &id)).await;

    match result {
        Ok(Ok(page)) => Json(page).into_response(),
        Ok(Err(e)) => feed_error_response(e),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn feed_error_response(e: FeedError) -> Response {
    let status = match e {
        FeedError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!(error = %e, "Feed service request failed");
            StatusCode::BAD_GATEWAY
        }
    };
    (status, e.to_string()).into_response()
}
