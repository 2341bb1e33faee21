//! Live snapshot subscription over WebSocket.
//!
//! [`LiveFeed`] keeps a connection to the server's snapshot socket open,
//! reconnecting with backoff when it drops, and republishes every received
//! snapshot on a `watch` channel. Consumers see it as a
//! [`SnapshotSource`]; ordering is left to the revision check in
//! [`IssueCache`](campus_core::cache::IssueCache).

use std::sync::Arc;

use campus_core::store::{FeedMessage, Snapshot, SnapshotSource};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::reconnect::{connect_with_backoff, Backoff, ReconnectConfig};

/// Errors establishing or reading the live connection.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Connection settings for the snapshot socket.
#[derive(Debug, Clone)]
pub struct LiveClient {
    ws_url: String,
}

/// An open snapshot socket.
pub struct LiveConnection {
    pub ws_stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl LiveClient {
    /// * `ws_url` - full socket URL, e.g. `ws://localhost:3000/api/v1/ws`.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub async fn connect(&self) -> Result<LiveConnection, LiveError> {
        let (ws_stream, _response) = connect_async(self.ws_url.as_str()).await.map_err(|e| {
            LiveError::Connection(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;
        tracing::info!(url = %self.ws_url, "Connected to live feed");
        Ok(LiveConnection { ws_stream })
    }
}

/// Decode one text frame.
pub fn parse_frame(text: &str) -> Result<Snapshot, LiveError> {
    match serde_json::from_str::<FeedMessage>(text) {
        Ok(FeedMessage::Snapshot(snapshot)) => Ok(snapshot),
        Err(e) => Err(LiveError::Protocol(e.to_string())),
    }
}

/// State of the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveStatus {
    Connecting,
    /// `generation` counts successful connections, starting at 1.
    Connected { generation: u32 },
    Closed,
}

/// Background task keeping the snapshot subscription alive.
pub struct LiveFeed {
    snapshots: watch::Receiver<Arc<Snapshot>>,
    status: watch::Receiver<LiveStatus>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl LiveFeed {
    /// Start the connection task. Must be called inside a tokio runtime.
    pub fn spawn(client: LiveClient, config: ReconnectConfig) -> Self {
        let (snapshot_tx, snapshots) = watch::channel(Arc::new(Snapshot::default()));
        let (status_tx, status) = watch::channel(LiveStatus::Connecting);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(client, config, cancel.clone(), snapshot_tx, status_tx));

        Self {
            snapshots,
            status,
            cancel,
            handle,
        }
    }

    pub fn status(&self) -> watch::Receiver<LiveStatus> {
        self.status.clone()
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Live feed task ended abnormally");
        }
    }
}

impl SnapshotSource for LiveFeed {
    fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }
}

async fn run(
    client: LiveClient,
    config: ReconnectConfig,
    cancel: CancellationToken,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    status_tx: watch::Sender<LiveStatus>,
) {
    let mut backoff = Backoff::new(config);
    let mut generation = 0u32;

    while let Some(mut connection) = connect_with_backoff(&client, &mut backoff, &cancel).await {
        generation += 1;
        status_tx.send_replace(LiveStatus::Connected { generation });

        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = pump(&mut connection, &snapshot_tx) => received,
        };

        tracing::warn!(url = client.ws_url(), generation, received, "Live feed disconnected");
        status_tx.send_replace(LiveStatus::Connecting);

        if received > 0 {
            backoff.reset();
        } else if !backoff.wait(&cancel).await {
            break;
        }
    }

    status_tx.send_replace(LiveStatus::Closed);
    tracing::info!(url = client.ws_url(), "Live feed stopped");
}

/// Forward snapshot frames until the socket closes or errors. Returns the
/// number of snapshots received.
async fn pump(connection: &mut LiveConnection, snapshot_tx: &watch::Sender<Arc<Snapshot>>) -> usize {
    let mut received = 0;
    while let Some(frame) = connection.ws_stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match parse_frame(&text) {
                Ok(snapshot) => {
                    tracing::debug!(
                        revision = snapshot.revision,
                        count = snapshot.issues.len(),
                        "Snapshot received",
                    );
                    snapshot_tx.send_replace(Arc::new(snapshot));
                    received += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unreadable live frame");
                }
            },
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Live feed closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Live feed receive error");
                break;
            }
        }
    }
    received
}
