use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Dashboard projections, merged at the `/api/v1` root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/overview", get(dashboard::overview))
        .route("/dashboard/issues", get(dashboard::issue_table))
        .route("/dashboard/issues/{id}", get(dashboard::issue_detail))
        .route("/analytics", get(dashboard::analytics))
        .route("/map", get(dashboard::map))
}
