//! End-to-end streaming through the public API

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, BodyDataStream};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

use dvbcast::buffer::{BufferConfig, TS_PACKET_SIZE};
use dvbcast::pipeline::Pipeline;
use dvbcast::server::{router, TS_CONTENT_TYPE};
use dvbcast::{ChannelList, DvbServer, PipelineLauncher, ServerConfig, Station};

const WAIT: Duration = Duration::from_secs(5);

fn station() -> Arc<Station> {
    Arc::new(
        Station::new(
            ChannelList::from_names(["news", "sports"]),
            None,
            BufferConfig::default().capacity(16),
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

async fn next_bytes(body: &mut BodyDataStream) -> Option<Bytes> {
    tokio::time::timeout(WAIT, body.next())
        .await
        .expect("timed out waiting for stream data")
        .map(|frame| frame.unwrap())
}

#[tokio::test]
async fn test_viewers_follow_channel_switch() {
    let station = station();
    let mut news = station.begin_feed("news");

    let current = get(&station, "/cur").await;
    assert_eq!(current.status(), StatusCode::OK);
    assert_eq!(current.headers()[header::CONTENT_TYPE], TS_CONTENT_TYPE);
    let mut current = current.into_body().into_data_stream();

    news.write(Bytes::from_static(b"news-1"));
    assert_eq!(next_bytes(&mut current).await.unwrap(), "news-1");

    // A second viewer switches the station to sports
    let sports_view = get(&station, "/chan/sports").await;
    assert_eq!(sports_view.status(), StatusCode::OK);
    let mut sports_view = sports_view.into_body().into_data_stream();
    assert_eq!(station.current_channel().as_deref(), Some("sports"));
    assert_eq!(station.viewers().get(), 2);

    // Late output from the old feed is rejected
    let mut sports = station.begin_feed("sports");
    assert!(!news.write(Bytes::from_static(b"news-2")));
    sports.write(Bytes::from_static(b"sports-1"));

    assert_eq!(next_bytes(&mut current).await.unwrap(), "sports-1");
    assert_eq!(next_bytes(&mut sports_view).await.unwrap(), "sports-1");

    let page = get(&station, "/").await;
    let html = axum::body::to_bytes(page.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(html.to_vec()).unwrap();
    assert!(html.contains("(sports) - 2 viewers."));

    station.shutdown();
    assert!(next_bytes(&mut current).await.is_none());
    assert!(next_bytes(&mut sports_view).await.is_none());

    drop(current);
    drop(sports_view);
    assert_eq!(station.viewers().get(), 0);
}

#[tokio::test]
async fn test_unknown_channel_keeps_selection() {
    let station = station();

    let response = get(&station, "/chan/weather").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"unknown channel: weather");
    assert_eq!(station.current_channel().as_deref(), Some("news"));
}

/// Hands out in-memory feeds instead of spawning a tuner
#[derive(Clone, Default)]
struct MemoryLauncher {
    feeds: Arc<Mutex<Vec<(String, DuplexStream)>>>,
}

impl MemoryLauncher {
    async fn wait_for_feed(&self, channel: &str) -> DuplexStream {
        tokio::time::timeout(WAIT, async {
            loop {
                {
                    let mut feeds = self.feeds.lock();
                    if let Some(i) = feeds.iter().position(|(name, _)| name == channel) {
                        return feeds.remove(i).1;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("pipeline was never launched")
    }
}

impl PipelineLauncher for MemoryLauncher {
    fn launch(&self, channel: &str) -> dvbcast::Result<Pipeline> {
        let (tx, rx) = tokio::io::duplex(64 * 1024);
        self.feeds.lock().push((channel.to_string(), tx));
        Ok(Pipeline::from_source(rx))
    }
}

fn packet(tag: &[u8]) -> Vec<u8> {
    let mut packet = vec![0xff; TS_PACKET_SIZE];
    packet[0] = 0x47;
    packet[1..1 + tag.len()].copy_from_slice(tag);
    packet
}

#[tokio::test]
async fn test_server_streams_pipeline_output() {
    let config = ServerConfig::default()
        .skip_device()
        .poll_interval(Duration::from_millis(10))
        .buffer(BufferConfig::default().capacity(16).chunk_size(TS_PACKET_SIZE));
    let server = DvbServer::with_channels(config, ChannelList::from_names(["news", "sports"]))
        .unwrap();
    let station = Arc::clone(server.station());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let launcher = MemoryLauncher::default();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = {
        let launcher = launcher.clone();
        tokio::spawn(async move {
            server
                .serve(listener, launcher, async {
                    let _ = stop_rx.await;
                })
                .await
        })
    };

    let mut feed = launcher.wait_for_feed("news").await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /cur HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    tokio::time::timeout(WAIT, async {
        while station.viewers().get() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    feed.write_all(&packet(b"dvbcast-news")).await.unwrap();

    let received = tokio::time::timeout(WAIT, async {
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        while !contains(&received, b"dvbcast-news") {
            let n = client.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed early");
            received.extend_from_slice(&buf[..n]);
        }
        received
    })
    .await
    .unwrap();

    let head = String::from_utf8_lossy(&received).to_lowercase();
    assert!(head.starts_with("http/1.1 200"));
    assert!(head.contains("content-type: video/mp2t"));

    drop(client);
    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert!(station.selection().is_shutdown());
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
