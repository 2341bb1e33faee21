//! Client crate against a real campus-api server: citizen submission over
//! HTTP, the live snapshot feed, and admin triage.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use campus_api::auth::jwt::JwtConfig;
use campus_api::auth::password::hash_password;
use campus_api::config::{AdminConfig, ServerConfig};
use campus_api::router::build_app_router;
use campus_api::state::AppState;
use campus_api::storage::LocalPhotoStore;
use campus_api::ws::{start_snapshot_broadcast, WsManager};
use campus_client::{
    ApiClientError, ClassificationClient, ClientConfig, IssueApi, LiveClient, LiveFeed,
    ReconnectConfig,
};
use campus_core::cache::{ApplyOutcome, IssueCache};
use campus_core::issue::{Category, Location, Severity, Status};
use campus_core::mutation::{PhotoUpload, ReportForm, StatusUpdate};
use campus_core::store::SnapshotSource;
use campus_core::submission::ReportSubmitter;
use campus_db::MemoryIssueStore;
use tempfile::TempDir;

const ADMIN_EMAIL: &str = "facilities@campus.edu";
const ADMIN_PASSWORD: &str = "triage-all-the-things";

/// Start a server over an in-memory store on an ephemeral port.
async fn serve(uploads: &TempDir) -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec![],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "remote-api-test-secret-with-enough-bytes".into(),
            access_token_expiry_mins: 5,
        },
        admin: AdminConfig {
            emails: vec![ADMIN_EMAIL.into()],
            password_hash: Some(hash_password(ADMIN_PASSWORD).unwrap()),
        },
        upload_dir: uploads.path().to_path_buf(),
        upload_max_bytes: 1024 * 1024,
        public_base_url: base_url.clone(),
        database_url: None,
    };

    let store = Arc::new(MemoryIssueStore::new());
    let ws_manager = Arc::new(WsManager::new());
    start_snapshot_broadcast(Arc::clone(&ws_manager), store.subscribe());

    let state = AppState {
        issues: store.clone(),
        snapshots: store,
        photos: Arc::new(LocalPhotoStore::new(uploads.path(), base_url.clone())),
        pool: None,
        config: Arc::new(config.clone()),
        ws_manager,
    };
    let app = build_app_router(state, &config);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ClientConfig::for_server(&base_url)
}

#[tokio::test]
async fn report_is_classified_stored_and_streamed_then_resolved() {
    let uploads = tempfile::tempdir().unwrap();
    let config = serve(&uploads).await;

    let api = Arc::new(IssueApi::new(config.api_url.clone()));
    let submitter = ReportSubmitter::new(
        Arc::new(ClassificationClient::new(config.classify_url.clone())),
        api.clone(),
        api.clone(),
    );

    let feed = LiveFeed::spawn(LiveClient::new(config.ws_url.clone()), ReconnectConfig::default());
    let mut snapshots = feed.subscribe();
    let mut cache = IssueCache::new();

    // --- Citizen submission ---
    let photo_bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    let form = ReportForm {
        description: "Water leak under the sink, urgent".into(),
        location: Some(Location::new(37.8719, -122.2585).with_address("Dwinelle Hall")),
        photos: vec![PhotoUpload {
            file_name: "sink.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: photo_bytes.clone(),
        }],
        ..Default::default()
    };
    let outcome = submitter.submit(&form).await.unwrap();

    assert_eq!(outcome.classification.category, Category::Plumbing);
    assert_eq!(outcome.classification.severity, Severity::High);
    assert_eq!(outcome.classification.confidence, 0.8);
    assert_eq!(outcome.failed_uploads, 0);
    assert_eq!(outcome.issue.status, Status::Pending);
    assert!(outcome.issue.reported_at.is_some());

    let photo_url = &outcome.issue.photo_urls[0];
    assert!(photo_url.contains("/files/issues/"));
    assert!(photo_url.ends_with("_0_sink.jpg"));
    let served = reqwest::get(photo_url).await.unwrap();
    assert!(served.status().is_success());
    assert_eq!(served.bytes().await.unwrap().as_ref(), photo_bytes.as_slice());

    // --- Live feed ---
    let reported = tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.issues.len() == 1),
    )
    .await
    .expect("snapshot with the new report should arrive")
    .unwrap()
    .clone();
    assert_eq!(cache.apply(reported.clone()), ApplyOutcome::Replaced);
    assert_eq!(cache.issues()[0].id, outcome.issue.id);

    // --- Triage ---
    let denied = api
        .update_issue_status(&outcome.issue.id, &StatusUpdate::plain(Status::InProgress))
        .await;
    assert_matches!(denied, Err(ApiClientError::ApiError { status: 401, .. }));

    let mut admin = IssueApi::new(config.api_url.clone());
    admin.admin_login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let resolved = admin
        .update_issue_status(&outcome.issue.id, &StatusUpdate::plain(Status::Resolved))
        .await
        .unwrap();
    assert_eq!(resolved.status, Status::Resolved);
    assert!(resolved.resolved_at.is_some());
    assert!(resolved.response_time_ms.unwrap() >= 0);

    let after = tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.revision > reported.revision),
    )
    .await
    .expect("snapshot with the resolution should arrive")
    .unwrap()
    .clone();
    assert_eq!(cache.apply(after), ApplyOutcome::Replaced);
    assert_eq!(cache.find(&outcome.issue.id).unwrap().status, Status::Resolved);
    assert_matches!(cache.apply(reported), ApplyOutcome::Stale { .. });

    feed.shutdown().await;
}

#[tokio::test]
async fn wrong_admin_password_is_rejected() {
    let uploads = tempfile::tempdir().unwrap();
    let config = serve(&uploads).await;

    let mut admin = IssueApi::new(config.api_url);
    let result = admin.admin_login(ADMIN_EMAIL, "guess").await;
    assert_matches!(result, Err(ApiClientError::ApiError { status: 401, .. }));
}
