//! Keepalive pings for dashboard sockets.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::ws::manager::WsManager;

/// How often idle dashboard sockets are pinged.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping every open socket each `every`, starting one period from now.
///
/// Runs until aborted through the returned handle.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let reached = ws_manager.broadcast(Message::Ping(Bytes::new())).await;
            if reached > 0 {
                tracing::trace!(reached, "Heartbeat ping sent");
            }
        }
    })
}
