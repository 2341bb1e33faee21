use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{classify, health};
use crate::state::AppState;

/// Root-level routes (not under `/api/v1`): banner, health checks and the
/// classification endpoint, which keeps the standalone service's path.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        .route("/api/classify", post(classify::classify))
}
