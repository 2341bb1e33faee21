use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

/// Mount at `/uploads`. Bodies above `max_bytes` are rejected with 413.
pub fn router(max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(uploads::upload_photo))
        .layer(DefaultBodyLimit::max(max_bytes))
}
