use std::sync::Arc;

use axum::extract::ws::Message;
use campus_core::store::Snapshot;
use serde::Serialize;
use tokio::sync::watch;

use crate::ws::manager::WsManager;

/// Borrowing twin of `FeedMessage`, so a frame can be encoded without
/// cloning the issue set.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedFrame<'a> {
    Snapshot(&'a Snapshot),
}

/// Encode a snapshot as a text frame.
pub fn snapshot_frame(snapshot: &Snapshot) -> Result<Message, serde_json::Error> {
    let json = serde_json::to_string(&FeedFrame::Snapshot(snapshot))?;
    Ok(Message::Text(json.into()))
}

/// Spawn the task that pushes every new snapshot to all connected clients.
///
/// Ends when the snapshot source is dropped. Intermediate snapshots may be
/// skipped under load; each frame carries the full set, so clients only
/// ever need the latest.
pub fn start_snapshot_broadcast(
    ws_manager: Arc<WsManager>,
    mut snapshots: watch::Receiver<Arc<Snapshot>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = Arc::clone(&snapshots.borrow_and_update());
            match snapshot_frame(&snapshot) {
                Ok(frame) => {
                    let reached = ws_manager.broadcast(frame).await;
                    tracing::debug!(
                        revision = snapshot.revision,
                        count = snapshot.issues.len(),
                        reached,
                        "Snapshot broadcast",
                    );
                }
                Err(e) => {
                    tracing::error!(revision = snapshot.revision, error = %e, "Failed to encode snapshot");
                }
            }
        }
        tracing::info!("Snapshot source closed, broadcaster stopped");
    })
}

#[cfg(test)]
mod tests {
    use campus_core::store::FeedMessage;

    use super::*;

    #[test]
    fn frame_matches_the_client_feed_format() {
        let snapshot = Snapshot {
            revision: 9,
            issues: Vec::new(),
        };
        let Message::Text(text) = snapshot_frame(&snapshot).unwrap() else {
            panic!("expected a text frame");
        };
        let decoded: FeedMessage = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(decoded, FeedMessage::Snapshot(snapshot));
    }

    #[tokio::test]
    async fn new_snapshots_are_broadcast() {
        let manager = Arc::new(WsManager::new());
        let mut conn = manager.add("a".into()).await;
        let (tx, rx) = watch::channel(Arc::new(Snapshot::default()));
        let handle = start_snapshot_broadcast(Arc::clone(&manager), rx);

        tx.send_replace(Arc::new(Snapshot {
            revision: 1,
            issues: Vec::new(),
        }));

        let Some(Message::Text(text)) = conn.recv().await else {
            panic!("expected a snapshot frame");
        };
        assert!(text.as_str().contains("\"revision\":1"));

        drop(tx);
        handle.await.unwrap();
    }
}
