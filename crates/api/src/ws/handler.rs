use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use campus_core::store::SnapshotSource;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::broadcast::snapshot_frame;
use crate::ws::manager::WsManager;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the client receives the current snapshot, then every
/// later one through the broadcaster.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, state.snapshots))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Queues the current snapshot for it.
///   3. Spawns a sender task that forwards messages from the manager channel.
///   4. Drains inbound messages until the client goes away or the sender
///      task ends.
async fn handle_socket(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    snapshots: Arc<dyn SnapshotSource>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone()).await;

    // Registered first, so a snapshot published from here on is broadcast
    // to this connection as well. A duplicate or older revision is dropped
    // by the client's cache.
    let current = Arc::clone(&snapshots.subscribe().borrow());
    match snapshot_frame(&current) {
        Ok(frame) => {
            ws_manager.send_to(&conn_id, frame).await;
        }
        Err(e) => {
            tracing::error!(conn_id = %conn_id, error = %e, "Failed to encode initial snapshot");
        }
    }

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                return;
            }
            if closing {
                return;
            }
        }
        // The manager dropped this connection (stalled queue).
        let _ = sink.send(Message::Close(None)).await;
    });

    // The feed is one-way; inbound frames other than Close are ignored.
    let inbound_conn_id = conn_id.clone();
    let drain_inbound = async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(Message::Pong(_)) => {
                    tracing::trace!(conn_id = %inbound_conn_id, "Pong received");
                }
                Ok(_msg) => {}
                Err(e) => {
                    tracing::debug!(conn_id = %inbound_conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = drain_inbound => {}
        _ = &mut send_task => {}
    }

    let connected_at = ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(
        conn_id = %conn_id,
        connected_secs = connected_at.map(|at| (chrono::Utc::now() - at).num_seconds()),
        "WebSocket disconnected",
    );
}
