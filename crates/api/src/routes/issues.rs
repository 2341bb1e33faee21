use axum::routing::{get, put};
use axum::Router;

use crate::handlers::issues;
use crate::state::AppState;

/// Mount at `/issues`.
///
/// ```text
/// GET, POST  /
/// GET        /recent
/// GET        /{id}
/// PUT        /{id}/status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(issues::list_issues).post(issues::create_issue))
        .route("/recent", get(issues::recent_issues))
        .route("/{id}", get(issues::get_issue))
        .route("/{id}/status", put(issues::update_status))
}
