use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use campus_core::store::{IssueStore, SnapshotSource};
use campus_db::{MemoryIssueStore, PgIssueStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_api::config::ServerConfig;
use campus_api::router::build_app_router;
use campus_api::state::AppState;
use campus_api::storage::LocalPhotoStore;
use campus_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campus_api=debug,campus_db=debug,campus_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    if config.admin.password_hash.is_none() {
        tracing::warn!("ADMIN_PASSWORD_HASH not set, admin login is disabled");
    }

    // --- Issue store ---
    let (issues, snapshots, pool) = open_store(&config).await;

    // --- Photo storage ---
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");
    let photos = Arc::new(LocalPhotoStore::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));
    tracing::info!(dir = ?config.upload_dir, "Photo storage ready");

    // --- WebSocket manager, heartbeat and snapshot fan-out ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), ws::HEARTBEAT_INTERVAL);
    let mut broadcast_handle =
        ws::start_snapshot_broadcast(Arc::clone(&ws_manager), snapshots.subscribe());

    // --- App state ---
    let state = AppState {
        issues,
        snapshots,
        photos,
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    // The router held the last store handle, so the snapshot feed is closed
    // and the broadcaster winds down on its own.
    if tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        &mut broadcast_handle,
    )
    .await
    .is_err()
    {
        tracing::warn!("Snapshot broadcaster did not stop in time, aborting");
        broadcast_handle.abort();
    }
    heartbeat_handle.abort();
    tracing::info!("Background tasks stopped");

    tracing::info!("Graceful shutdown complete");
}

type Stores = (
    Arc<dyn IssueStore>,
    Arc<dyn SnapshotSource>,
    Option<campus_db::DbPool>,
);

/// PostgreSQL when `DATABASE_URL` is set, otherwise a process-local store
/// that starts empty on every run. Any database failure aborts startup.
async fn open_store(config: &ServerConfig) -> Stores {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, keeping issues in memory");
        let store = Arc::new(MemoryIssueStore::new());
        return (store.clone(), store, None);
    };

    let pool = campus_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    campus_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    campus_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready, migrations applied");

    let store = Arc::new(
        PgIssueStore::connect(pool.clone())
            .await
            .expect("Failed to load issues"),
    );
    let revision = store.subscribe().borrow().revision;
    tracing::info!(revision, "Issues loaded");
    (store.clone(), store, Some(pool))
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
