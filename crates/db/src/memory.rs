//! Process-local issue store.
//!
//! Used by tests and when the server runs without a database. Writes are
//! serialized by the lock, and each one publishes a snapshot before the
//! lock is released.

use std::sync::Arc;

use async_trait::async_trait;
use campus_core::issue::{Issue, NewIssue};
use campus_core::mutation::StatusUpdate;
use campus_core::store::{IssueStore, Snapshot, SnapshotSource, StoreError};
use chrono::Utc;
use tokio::sync::{watch, RwLock};

use crate::feed::SnapshotFeed;

#[derive(Debug)]
pub struct MemoryIssueStore {
    issues: RwLock<Vec<Issue>>,
    feed: SnapshotFeed,
}

impl Default for MemoryIssueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIssueStore {
    pub fn new() -> Self {
        Self::with_issues(Vec::new())
    }

    /// A store pre-loaded with `issues`, published as the first snapshot.
    pub fn with_issues(mut issues: Vec<Issue>) -> Self {
        sort_newest_first(&mut issues);
        let feed = SnapshotFeed::starting_now();
        feed.publish(issues.clone());
        Self {
            issues: RwLock::new(issues),
            feed,
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.feed.current()
    }
}

fn sort_newest_first(issues: &mut [Issue]) {
    issues.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
}

pub(crate) fn new_issue_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

#[async_trait]
impl IssueStore for MemoryIssueStore {
    async fn list(&self, limit: Option<usize>) -> Result<Vec<Issue>, StoreError> {
        let issues = self.issues.read().await;
        let take = limit.unwrap_or(issues.len());
        Ok(issues.iter().take(take).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Issue, StoreError> {
        self.issues
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn create(&self, input: NewIssue) -> Result<Issue, StoreError> {
        input.validate()?;
        let now = Utc::now();
        let issue = Issue {
            id: new_issue_id(),
            description: input.description,
            category: input.category,
            severity: input.severity,
            status: input.status,
            location: Some(input.location),
            photo_urls: input.photo_urls,
            ai_classification: input.ai_classification,
            reported_at: Some(now),
            updated_at: Some(now),
            resolved_at: None,
            response_time_ms: None,
            reporter_id: input.reporter_id,
        };

        let mut issues = self.issues.write().await;
        issues.insert(0, issue.clone());
        let revision = self.feed.publish(issues.clone());
        tracing::info!(issue_id = %issue.id, revision, "Issue created");
        Ok(issue)
    }

    async fn update_status(&self, id: &str, update: StatusUpdate) -> Result<Issue, StoreError> {
        let now = Utc::now();
        let mut issues = self.issues.write().await;
        let issue = issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let update = update.normalized_for(issue, now);
        update.apply_to(issue, now);
        let updated = issue.clone();

        let revision = self.feed.publish(issues.clone());
        tracing::info!(issue_id = %id, status = %updated.status, revision, "Issue status updated");
        Ok(updated)
    }
}

impl SnapshotSource for MemoryIssueStore {
    fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.feed.subscribe()
    }
}
