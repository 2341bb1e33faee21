use std::sync::Arc;

use campus_core::store::{IssueStore, SnapshotSource};

use crate::config::ServerConfig;
use crate::storage::LocalPhotoStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// The issue collection (PostgreSQL or in-memory).
    pub issues: Arc<dyn IssueStore>,
    /// Snapshot feed of the same collection, fanned out over `/ws`.
    pub snapshots: Arc<dyn SnapshotSource>,
    /// Uploaded report photos on local disk.
    pub photos: Arc<LocalPhotoStore>,
    /// Database pool, when running against PostgreSQL. Used by health checks.
    pub pool: Option<campus_db::DbPool>,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (dashboard clients).
    pub ws_manager: Arc<WsManager>,
}
