//! Ports to the remote collaborators: the issue document store, its live
//! snapshot feed, and photo storage.
//!
//! Implementations live in `campus-db` (server side) and `campus-client`
//! (over HTTP). The submission flow and the dashboard only see these traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::CoreError;
use crate::issue::{Issue, NewIssue};
use crate::mutation::{PhotoUpload, StatusUpdate};
use crate::types::IssueId;

/// Collection name of the issue documents.
pub const ISSUES_COLLECTION: &str = "issues";

/// Errors reported by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Issue {id} not found")]
    NotFound { id: IssueId },

    #[error("Invalid document: {0}")]
    Invalid(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { id, .. } => StoreError::NotFound { id },
            CoreError::Validation(msg) => StoreError::Invalid(msg),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => CoreError::NotFound { entity: "Issue", id },
            StoreError::Invalid(msg) => CoreError::Validation(msg),
            StoreError::Unavailable(msg) => CoreError::Internal(msg),
        }
    }
}

/// The complete issue set at one point in time.
///
/// `revision` increases with every write, so a consumer can tell a fresh
/// delivery from a delayed stale one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub revision: u64,
    pub issues: Vec<Issue>,
}

/// Text frames on the live snapshot WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    Snapshot(Snapshot),
}

/// Reads and writes against the issue collection.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Issues ordered by report time, newest first, optionally limited.
    async fn list(&self, limit: Option<usize>) -> Result<Vec<Issue>, StoreError>;

    async fn get(&self, id: &str) -> Result<Issue, StoreError>;

    /// Create a document; the store assigns the id and timestamps.
    async fn create(&self, issue: NewIssue) -> Result<Issue, StoreError>;

    /// Apply a partial status update and return the stored result.
    async fn update_status(&self, id: &str, update: StatusUpdate) -> Result<Issue, StoreError>;
}

/// A push channel delivering the full current set after every change.
pub trait SnapshotSource: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>>;
}

/// Blob storage for report photos.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Store `photo` under `key` and return a publicly resolvable URL.
    async fn upload(&self, key: &str, photo: &PhotoUpload) -> Result<String, StoreError>;
}

/// A photo that has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPhoto {
    pub key: String,
    pub url: String,
}

/// Storage key for the `index`-th photo of a submission started at
/// `uploaded_at_ms` (Unix milliseconds).
pub fn photo_key(uploaded_at_ms: i64, index: usize, file_name: &str) -> String {
    format!(
        "{ISSUES_COLLECTION}/{uploaded_at_ms}_{index}_{}",
        sanitize_file_name(file_name)
    )
}

/// Reduce a client-supplied file name to a safe single path segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned.to_string()
    }
}
