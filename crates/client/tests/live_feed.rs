//! Live snapshot subscription against a throw-away WebSocket server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::routing::get;
use axum::Router;
use campus_client::{LiveClient, LiveFeed, LiveStatus, ReconnectConfig};
use campus_core::store::{FeedMessage, Snapshot, SnapshotSource};

/// Serve a socket that sends one snapshot per connection and then closes.
/// Each connection gets the next revision.
async fn serve_one_shot_snapshots() -> String {
    let revisions = Arc::new(AtomicU64::new(0));

    let app = Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade| {
            let revisions = Arc::clone(&revisions);
            async move {
                ws.on_upgrade(move |mut socket| async move {
                    let revision = revisions.fetch_add(1, Ordering::SeqCst) + 1;
                    let frame = serde_json::to_string(&FeedMessage::Snapshot(Snapshot {
                        revision,
                        issues: Vec::new(),
                    }))
                    .unwrap();
                    let _ = socket.send(Message::Text(frame.into())).await;
                    let _ = socket.send(Message::Close(None)).await;
                })
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

fn fast_backoff() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        multiplier: 2.0,
    }
}

#[tokio::test]
async fn snapshots_flow_across_reconnects() {
    let url = serve_one_shot_snapshots().await;
    let feed = LiveFeed::spawn(LiveClient::new(url), fast_backoff());

    let mut snapshots = feed.subscribe();
    let mut status = feed.status();

    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.revision >= 2),
    )
    .await
    .expect("second snapshot should arrive after a reconnect")
    .unwrap()
    .clone();
    assert!(snapshot.issues.is_empty());

    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| matches!(s, LiveStatus::Connected { generation } if *generation >= 2)),
    )
    .await
    .expect("feed should report a second connection")
    .unwrap();

    feed.shutdown().await;
    assert_eq!(*status.borrow(), LiveStatus::Closed);
}

#[tokio::test]
async fn unreachable_server_keeps_connecting_until_shutdown() {
    // Port 9 (discard) is closed on test machines.
    let feed = LiveFeed::spawn(LiveClient::new("ws://127.0.0.1:9/ws"), fast_backoff());
    let status = feed.status();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*status.borrow(), LiveStatus::Connecting);
    assert_eq!(feed.subscribe().borrow().revision, 0);

    feed.shutdown().await;
    assert_eq!(*status.borrow(), LiveStatus::Closed);
}
