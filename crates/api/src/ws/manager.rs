use std::collections::HashMap;

use axum::extract::ws::Message;
use campus_core::types::Timestamp;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Frames a connection may have queued before it counts as stalled.
///
/// Every snapshot carries the full issue set, so a stalled socket is cut off
/// rather than allowed to pile them up; it gets a fresh snapshot when it
/// reconnects.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 16;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::Sender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Open dashboard sockets, keyed by connection id.
///
/// Each socket has a bounded outbound queue drained by its own sender task,
/// so a slow client never blocks a snapshot broadcast.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection, returning when it was established.
    pub async fn remove(&self, conn_id: &str) -> Option<Timestamp> {
        self.connections
            .write()
            .await
            .remove(conn_id)
            .map(|conn| conn.connected_at)
    }

    /// Send a message to one connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => conn.sender.try_send(message).is_ok(),
            None => false,
        }
    }

    /// Queue `message` for every connection and return how many accepted it.
    ///
    /// Connections whose receiving side is gone, or whose queue is full, are
    /// dropped from the map. Dropping the sender ends the connection's sink
    /// task, which closes the socket.
    pub async fn broadcast(&self, message: Message) -> usize {
        let mut closed = Vec::new();
        let mut reached = 0;
        {
            let conns = self.connections.read().await;
            for (conn_id, conn) in conns.iter() {
                match conn.sender.try_send(message.clone()) {
                    Ok(()) => reached += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(conn_id = %conn_id, "WebSocket client stalled, disconnecting");
                        closed.push(conn_id.clone());
                    }
                    Err(TrySendError::Closed(_)) => closed.push(conn_id.clone()),
                }
            }
        }
        if !closed.is_empty() {
            let mut conns = self.connections.write().await;
            for conn_id in &closed {
                conns.remove(conn_id);
            }
            tracing::debug!(pruned = closed.len(), "Dropped closed WebSocket connections");
        }
        reached
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.try_send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let manager = WsManager::new();
        let mut a = manager.add("a".into()).await;
        let mut b = manager.add("b".into()).await;

        assert_eq!(manager.broadcast(Message::Text("hello".into())).await, 2);

        assert_eq!(a.recv().await, Some(Message::Text("hello".into())));
        assert_eq!(b.recv().await, Some(Message::Text("hello".into())));
    }

    #[tokio::test]
    async fn send_to_targets_one_connection() {
        let manager = WsManager::new();
        let mut a = manager.add("a".into()).await;
        let _b = manager.add("b".into()).await;

        assert!(manager.send_to("a", Message::Text("only a".into())).await);
        assert!(!manager.send_to("missing", Message::Text("x".into())).await);
        assert_eq!(a.recv().await, Some(Message::Text("only a".into())));
    }

    #[tokio::test]
    async fn broadcast_prunes_closed_receivers() {
        let manager = WsManager::new();
        let mut live = manager.add("live".into()).await;
        drop(manager.add("gone".into()).await);

        assert_eq!(manager.broadcast(Message::Text("snapshot".into())).await, 1);
        assert_eq!(manager.connection_count().await, 1);
        assert_eq!(live.recv().await, Some(Message::Text("snapshot".into())));
    }

    #[tokio::test]
    async fn stalled_connection_is_cut_off() {
        let manager = WsManager::new();
        let mut stalled = manager.add("stalled".into()).await;

        for _ in 0..OUTBOUND_QUEUE_CAPACITY {
            assert_eq!(manager.broadcast(Message::Text("snapshot".into())).await, 1);
        }
        assert_eq!(manager.broadcast(Message::Text("one more".into())).await, 0);
        assert_eq!(manager.connection_count().await, 0);

        let mut queued = 0;
        while let Some(frame) = stalled.recv().await {
            assert_eq!(frame, Message::Text("snapshot".into()));
            queued += 1;
        }
        assert_eq!(queued, OUTBOUND_QUEUE_CAPACITY);
    }

    #[tokio::test]
    async fn remove_and_shutdown() {
        let manager = WsManager::new();
        let mut a = manager.add("a".into()).await;
        let _b = manager.add("b".into()).await;

        assert!(manager.remove("b").await.is_some());
        assert!(manager.remove("b").await.is_none());
        assert_eq!(manager.connection_count().await, 1);

        manager.shutdown_all().await;
        assert_eq!(manager.connection_count().await, 0);
        assert_eq!(a.recv().await, Some(Message::Close(None)));
    }
}
