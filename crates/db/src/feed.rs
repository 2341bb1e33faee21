//! Snapshot fan-out shared by the store implementations.

use std::sync::Arc;

use campus_core::issue::Issue;
use campus_core::store::Snapshot;
use chrono::Utc;
use tokio::sync::watch;

/// Publishes the full issue set after every write.
///
/// Each publication carries a revision one greater than the last, so a
/// subscriber can discard deliveries that arrive out of order.
#[derive(Debug)]
pub struct SnapshotFeed {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotFeed {
    pub fn new(initial_revision: u64) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot {
            revision: initial_revision,
            issues: Vec::new(),
        }));
        Self { tx }
    }

    /// A feed whose revisions start at the current Unix time in
    /// milliseconds, so they keep increasing across process restarts.
    pub fn starting_now() -> Self {
        Self::new(u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default())
    }

    /// Publish `issues` as the new current set and return its revision.
    pub fn publish(&self, issues: Vec<Issue>) -> u64 {
        let mut revision = 0;
        self.tx.send_modify(|current| {
            revision = current.revision + 1;
            *current = Arc::new(Snapshot { revision, issues });
        });
        tracing::debug!(revision, subscribers = self.tx.receiver_count(), "Snapshot published");
        revision
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisions_increase_by_one() {
        let feed = SnapshotFeed::new(10);
        assert_eq!(feed.publish(Vec::new()), 11);
        assert_eq!(feed.publish(Vec::new()), 12);
        assert_eq!(feed.current().revision, 12);
    }

    #[tokio::test]
    async fn subscribers_see_latest() {
        let feed = SnapshotFeed::new(0);
        let mut rx = feed.subscribe();
        feed.publish(Vec::new());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().revision, 1);
    }

    #[test]
    fn starting_now_is_nonzero() {
        assert!(SnapshotFeed::starting_now().current().revision > 0);
    }
}
