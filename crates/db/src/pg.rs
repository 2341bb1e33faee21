//! PostgreSQL-backed issue store.

use std::sync::Arc;

use async_trait::async_trait;
use campus_core::issue::{Issue, NewIssue};
use campus_core::mutation::StatusUpdate;
use campus_core::store::{IssueStore, Snapshot, SnapshotSource, StoreError};
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::{watch, Mutex};

use crate::feed::SnapshotFeed;
use crate::memory::new_issue_id;
use crate::repositories::IssueRepo;

/// Issue store over the `issues` table.
///
/// Writes made through this store are serialized and each is followed by a
/// full reload that is published as a new snapshot. Rows written by other
/// processes appear on the next [`refresh`](Self::refresh).
pub struct PgIssueStore {
    pool: PgPool,
    feed: SnapshotFeed,
    write_lock: Mutex<()>,
}

fn db_error(e: sqlx::Error) -> StoreError {
    tracing::error!(error = %e, "Database error");
    StoreError::Unavailable(e.to_string())
}

impl PgIssueStore {
    /// Wrap `pool` and publish the current table contents.
    pub async fn connect(pool: PgPool) -> Result<Self, StoreError> {
        let store = Self {
            pool,
            feed: SnapshotFeed::starting_now(),
            write_lock: Mutex::new(()),
        };
        store.refresh().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Reload every issue and publish the result.
    pub async fn refresh(&self) -> Result<u64, StoreError> {
        let issues = self.load_all().await?;
        Ok(self.feed.publish(issues))
    }

    async fn load_all(&self) -> Result<Vec<Issue>, StoreError> {
        let rows = IssueRepo::list(&self.pool, None).await.map_err(db_error)?;
        Ok(rows.into_iter().map(Issue::from).collect())
    }

    async fn publish_after_write(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Write succeeded but snapshot reload failed");
        }
    }
}

#[async_trait]
impl IssueStore for PgIssueStore {
    async fn list(&self, limit: Option<usize>) -> Result<Vec<Issue>, StoreError> {
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = IssueRepo::list(&self.pool, limit).await.map_err(db_error)?;
        Ok(rows.into_iter().map(Issue::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Issue, StoreError> {
        IssueRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)?
            .map(Issue::from)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn create(&self, input: NewIssue) -> Result<Issue, StoreError> {
        input.validate()?;
        let _guard = self.write_lock.lock().await;

        let id = new_issue_id();
        let row = IssueRepo::create(&self.pool, &id, &input)
            .await
            .map_err(db_error)?;
        tracing::info!(issue_id = %id, "Issue created");

        self.publish_after_write().await;
        Ok(row.into())
    }

    async fn update_status(&self, id: &str, update: StatusUpdate) -> Result<Issue, StoreError> {
        let _guard = self.write_lock.lock().await;

        let current = self.get(id).await?;
        let update = update.normalized_for(&current, Utc::now());
        let row = IssueRepo::update_status(&self.pool, id, &update)
            .await
            .map_err(db_error)?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        tracing::info!(issue_id = %id, status = %update.status, "Issue status updated");

        self.publish_after_write().await;
        Ok(row.into())
    }
}

impl SnapshotSource for PgIssueStore {
    fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.feed.subscribe()
    }
}
