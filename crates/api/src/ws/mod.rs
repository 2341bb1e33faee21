//! WebSocket infrastructure for the live snapshot feed.
//!
//! Provides connection management, heartbeat pings, the snapshot
//! broadcaster, and the HTTP upgrade handler used by Axum routes.

mod broadcast;
mod handler;
mod heartbeat;
pub mod manager;

pub use broadcast::{snapshot_frame, start_snapshot_broadcast};
pub use handler::ws_handler;
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL};
pub use manager::WsManager;
