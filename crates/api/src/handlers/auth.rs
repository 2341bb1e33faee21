//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::Json;
use campus_core::error::CoreError;
use campus_core::session::is_admin_email;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::issue_token;
use crate::auth::password::verify_password;
use crate::auth::ROLE_ADMIN;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid admin credentials";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/admin-login`.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/admin-login
///
/// The email must be on the admin allowlist and the password must match the
/// configured shared admin password.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(input): Json<AdminLoginRequest>,
) -> AppResult<Json<DataResponse<AdminLoginResponse>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let email = input.email.trim().to_lowercase();
    let admin = &state.config.admin;

    let Some(password_hash) = admin.password_hash.as_deref() else {
        return Err(AppError::Core(CoreError::Forbidden(
            "Admin login is not configured".into(),
        )));
    };

    if !is_admin_email(&admin.emails, &email) {
        tracing::warn!(email = %email, "Admin login rejected: email not allowlisted");
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    let password_valid = verify_password(&input.password, password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::warn!(email = %email, "Admin login rejected: wrong password");
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    let issued = issue_token(&email, ROLE_ADMIN, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(email = %email, token_id = %issued.claims.jti, "Admin logged in");
    Ok(Json(DataResponse {
        data: AdminLoginResponse {
            access_token: issued.token,
            expires_in: state.config.jwt.expires_in_secs(),
            email,
        },
    }))
}
