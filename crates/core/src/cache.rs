//! Client-side cache of the latest issue snapshot.

use std::sync::Arc;

use crate::issue::Issue;
use crate::store::Snapshot;

/// The most recently accepted snapshot; the single source for rendering.
#[derive(Debug, Clone, Default)]
pub struct IssueCache {
    snapshot: Option<Arc<Snapshot>>,
}

/// What happened to a delivered snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Replaced,
    /// The delivery was not newer than what the cache already holds.
    Stale { current: u64, delivered: u64 },
}

impl IssueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached set with `snapshot` unless it is older than, or as
    /// old as, the one already held.
    pub fn apply(&mut self, snapshot: Arc<Snapshot>) -> ApplyOutcome {
        if let Some(current) = &self.snapshot {
            if snapshot.revision <= current.revision {
                tracing::debug!(
                    current = current.revision,
                    delivered = snapshot.revision,
                    "Ignoring stale snapshot",
                );
                return ApplyOutcome::Stale {
                    current: current.revision,
                    delivered: snapshot.revision,
                };
            }
        }
        tracing::debug!(
            revision = snapshot.revision,
            count = snapshot.issues.len(),
            "Snapshot applied",
        );
        self.snapshot = Some(snapshot);
        ApplyOutcome::Replaced
    }

    /// Forget the held snapshot, e.g. after reconnecting to a restarted feed.
    pub fn reset(&mut self) {
        self.snapshot = None;
    }

    /// `true` until the first snapshot arrives.
    pub fn is_loading(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn revision(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.revision)
    }

    pub fn issues(&self) -> &[Issue] {
        self.snapshot
            .as_deref()
            .map(|s| s.issues.as_slice())
            .unwrap_or(&[])
    }

    pub fn find(&self, id: &str) -> Option<&Issue> {
        self.issues().iter().find(|i| i.id == id)
    }
}
