pub mod auth;
pub mod dashboard;
pub mod health;
pub mod issues;
pub mod uploads;

use axum::routing::get;
use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   WebSocket snapshot feed
///
/// /auth/admin-login                     admin login (public)
///
/// /issues                               list (public), create (public)
/// /issues/recent                        newest issues (public)
/// /issues/{id}                          get (public)
/// /issues/{id}/status                   update status (admin)
///
/// /dashboard/overview                   counters + priority cards (admin)
/// /dashboard/issues                     filtered table rows (admin)
/// /dashboard/issues/{id}                detail view (admin)
/// /analytics                            analytics view (public)
/// /map                                  markers + heat points (public)
///
/// /uploads                              photo upload (public, multipart)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/issues", issues::router())
        .merge(dashboard::router())
        .nest("/uploads", uploads::router(config.upload_max_bytes))
}
