//! HTTP routes
//!
//! | Path | Description |
//! |------|-------------|
//! | `/` | Channel directory |
//! | `/cur`, `/stream` | Live stream that follows the current channel |
//! | `/chan/{channel}` | Switch to `channel`, then stream it |
//!
//! Stream bodies never end on their own; they finish when the client goes
//! away or the station shuts down.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use futures::StreamExt;

use super::page::render_directory;
use crate::error::Error;
use crate::session::{SessionMode, StreamSession};
use crate::station::Station;

/// MIME type of the live feed
pub const TS_CONTENT_TYPE: &str = "video/MP2T";

/// Build the router for a station
pub fn router(station: Arc<Station>) -> Router {
    Router::new()
        .route("/", get(directory))
        .route("/cur", get(current_stream))
        .route("/stream", get(current_stream))
        .route("/chan/{channel}", get(channel_stream))
        .fallback(not_found)
        .with_state(station)
}

async fn directory(State(station): State<Arc<Station>>) -> Html<String> {
    Html(render_directory(&station.stats(), station.channels()))
}

async fn current_stream(State(station): State<Arc<Station>>) -> Response {
    stream_response(station.open_session(SessionMode::FollowCurrent))
}

async fn channel_stream(
    State(station): State<Arc<Station>>,
    Path(channel): Path<String>,
) -> Response {
    match station.select(&channel) {
        Ok(_) => stream_response(station.open_session(SessionMode::Fixed)),
        Err(e) => error_response(&e),
    }
}

async fn not_found() -> Response {
    plain_text(StatusCode::NOT_FOUND, "Page not found")
}

fn stream_response(session: StreamSession) -> Response {
    let stream = session
        .into_stream()
        .map(Ok::<_, std::io::Error>);

    (
        [(header::CONTENT_TYPE, TS_CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response()
}

fn error_response(error: &Error) -> Response {
    if error.is_not_found() {
        plain_text(StatusCode::NOT_FOUND, error.to_string())
    } else {
        tracing::error!(error = %error, "Request failed");
        plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }
}

fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::buffer::BufferConfig;
    use crate::channel::ChannelList;

    fn station() -> Arc<Station> {
        Arc::new(
            Station::new(
                ChannelList::from_names(["news", "sports"]),
                None,
                BufferConfig::default().capacity(8),
            )
            .unwrap(),
        )
    }

    async fn get(station: &Arc<Station>, uri: &str) -> Response {
        router(Arc::clone(station))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = get(&station(), "/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_channel_does_not_switch() {
        let station = station();

        let response = get(&station, "/chan/weather").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(station.current_channel().as_deref(), Some("news"));
        assert_eq!(station.viewers().get(), 0);
    }

    #[tokio::test]
    async fn test_known_channel_switches_and_streams() {
        let station = station();

        let response = get(&station, "/chan/sports").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TS_CONTENT_TYPE);
        assert_eq!(station.current_channel().as_deref(), Some("sports"));
        assert_eq!(station.viewers().get(), 1);

        drop(response);
        assert_eq!(station.viewers().get(), 0);
    }

    #[tokio::test]
    async fn test_stream_alias() {
        let station = station();

        for uri in ["/cur", "/stream"] {
            let response = get(&station, uri).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CONTENT_TYPE], TS_CONTENT_TYPE);
        }
    }

    #[tokio::test]
    async fn test_directory_page() {
        let station = station();

        let response = get(&station, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("(news) - 0 viewers."));
        assert!(html.contains("/chan/sports"));
    }
}
