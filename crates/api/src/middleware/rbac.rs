//! Admin authorization.
//!
//! The dashboard's session gate is advisory; this extractor is where
//! privileged requests are actually authorized.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use campus_core::error::CoreError;
use campus_core::session::is_admin_email;

use super::auth::AuthUser;
use crate::auth::ROLE_ADMIN;
use crate::error::AppError;
use crate::state::AppState;

/// An admin token whose email is still on the configured allowlist.
///
/// Taking an email off `ADMIN_EMAILS` revokes its outstanding tokens at the
/// next restart, without waiting for them to expire.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(CoreError::Forbidden("Admin role required".into()).into());
        }
        if !is_admin_email(&state.config.admin.emails, &user.email) {
            tracing::warn!(email = %user.email, token_id = %user.token_id, "Token for a de-listed admin");
            return Err(CoreError::Forbidden("Admin access revoked".into()).into());
        }
        Ok(RequireAdmin(user))
    }
}
