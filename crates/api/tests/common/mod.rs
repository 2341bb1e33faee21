#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use campus_core::issue::{Category, Issue, Location, Severity, Status};
use campus_core::types::Timestamp;
use campus_db::MemoryIssueStore;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use campus_api::auth::jwt::{issue_token, JwtConfig};
use campus_api::auth::password::hash_password;
use campus_api::config::{AdminConfig, ServerConfig};
use campus_api::router::build_app_router;
use campus_api::state::AppState;
use campus_api::storage::LocalPhotoStore;
use campus_api::ws::WsManager;

pub const ADMIN_EMAIL: &str = "admin@campus.com";
pub const ADMIN_PASSWORD: &str = "campus-admin-pass";

/// Hashing is slow on purpose; do it once per test binary.
fn admin_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(ADMIN_PASSWORD).unwrap())
        .clone()
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        admin: AdminConfig {
            emails: vec![ADMIN_EMAIL.to_string(), "ops@campus.edu".to_string()],
            password_hash: Some(admin_password_hash()),
        },
        upload_dir: upload_dir.to_path_buf(),
        upload_max_bytes: 1024 * 1024,
        public_base_url: "http://files.test".to_string(),
        database_url: None,
    }
}

/// A router over an in-memory store, plus handles the tests inspect.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryIssueStore>,
    pub config: ServerConfig,
    pub state: AppState,
    /// Keeps the upload directory alive for the test's duration.
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_issues(Vec::new())
    }

    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self::with_config(issues, |_| {})
    }

    pub fn with_config(issues: Vec<Issue>, tweak: impl FnOnce(&mut ServerConfig)) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = test_config(uploads.path());
        tweak(&mut config);

        let store = Arc::new(MemoryIssueStore::with_issues(issues));
        let state = AppState {
            issues: store.clone(),
            snapshots: store.clone(),
            photos: Arc::new(LocalPhotoStore::new(
                uploads.path(),
                config.public_base_url.clone(),
            )),
            pool: None,
            config: Arc::new(config.clone()),
            ws_manager: Arc::new(WsManager::new()),
        };
        let router = build_app_router(state.clone(), &config);

        Self {
            router,
            store,
            config,
            state,
            uploads,
        }
    }

    pub fn admin_token(&self) -> String {
        self.token_for(ADMIN_EMAIL, "admin")
    }

    /// A signed token for any email and role.
    pub fn token_for(&self, email: &str, role: &str) -> String {
        issue_token(email, role, &self.config.jwt).unwrap().token
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        get(self.router.clone(), uri).await
    }

    pub async fn get_as_admin(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.admin_token()))
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: Value,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A located issue with a known report time.
pub fn seeded_issue(
    id: &str,
    category: Category,
    severity: Severity,
    status: Status,
    reported_at: Timestamp,
) -> Issue {
    Issue {
        id: id.to_string(),
        description: format!("Seeded issue {id}"),
        category,
        severity,
        status,
        location: Some(Location::new(37.8719, -122.2585).with_address("Main Library")),
        photo_urls: Vec::new(),
        ai_classification: None,
        reported_at: Some(reported_at),
        updated_at: Some(reported_at),
        resolved_at: None,
        response_time_ms: None,
        reporter_id: Some("anonymous".to_string()),
    }
}

/// JSON body of a valid citizen report.
pub fn report_body(description: &str) -> Value {
    serde_json::json!({
        "description": description,
        "location": { "latitude": 37.8719, "longitude": -122.2585 },
        "category": "plumbing",
        "severity": "high",
        "photo_urls": [],
        "reporter_id": "anonymous"
    })
}
