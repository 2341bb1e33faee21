//! Issue persistence for the campus reporter.
//!
//! Two [`IssueStore`](campus_core::IssueStore) implementations share the
//! [`SnapshotFeed`]: [`PgIssueStore`] over PostgreSQL and
//! [`MemoryIssueStore`] for tests and database-less runs.

use sqlx::postgres::PgPoolOptions;

pub mod feed;
pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;

pub use feed::SnapshotFeed;
pub use memory::MemoryIssueStore;
pub use pg::PgIssueStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
