use std::path::PathBuf;

use campus_core::session::DEFAULT_ADMIN_EMAILS;

use crate::auth::jwt::JwtConfig;
use crate::auth::password::check_hash;

/// Default upload size limit (10 MiB).
const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except `JWT_SECRET` have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Grace period for background tasks after the listener stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    /// Directory holding uploaded photos (default: `./uploads`).
    pub upload_dir: PathBuf,
    /// Largest accepted upload body in bytes (default: 10 MiB).
    pub upload_max_bytes: usize,
    /// Origin used to build photo URLs (default: `http://localhost:{port}`).
    pub public_base_url: String,
    /// PostgreSQL URL. Without it the server keeps issues in memory.
    pub database_url: Option<String>,
}

/// Who may sign in to the dashboard.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Allowlisted admin emails, compared case-insensitively.
    pub emails: Vec<String>,
    /// Argon2 PHC hash of the shared admin password. Admin login is
    /// disabled while unset.
    pub password_hash: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                 |
    /// |-------------------------|-----------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                               |
    /// | `PORT`                  | `3000`                                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`                 |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                    |
    /// | `ADMIN_EMAILS`          | `admin@campus.com,admin@example.com`    |
    /// | `ADMIN_PASSWORD_HASH`   | unset (admin login disabled)            |
    /// | `UPLOAD_DIR`            | `./uploads`                             |
    /// | `UPLOAD_MAX_BYTES`      | `10485760`                              |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:{PORT}`               |
    /// | `DATABASE_URL`          | unset (in-memory store)                 |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = split_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let admin = AdminConfig {
            emails: std::env::var("ADMIN_EMAILS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|_| DEFAULT_ADMIN_EMAILS.iter().map(|e| e.to_string()).collect()),
            password_hash: std::env::var("ADMIN_PASSWORD_HASH")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty()),
        };
        if let Some(hash) = &admin.password_hash {
            if let Err(e) = check_hash(hash) {
                panic!("ADMIN_PASSWORD_HASH is not a valid PHC string: {e}");
            }
        }

        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()));

        let upload_max_bytes: usize = std::env::var("UPLOAD_MAX_BYTES")
            .unwrap_or_else(|_| DEFAULT_UPLOAD_MAX_BYTES.to_string())
            .parse()
            .expect("UPLOAD_MAX_BYTES must be a valid usize");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            admin,
            upload_dir,
            upload_max_bytes,
            public_base_url,
            database_url,
        }
    }
}

/// Split a comma-separated env value, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_are_trimmed() {
        assert_eq!(
            split_list(" a@x.edu , ,b@x.edu,"),
            vec!["a@x.edu".to_string(), "b@x.edu".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
