use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Mount at `/auth`.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin-login", post(auth::admin_login))
}
