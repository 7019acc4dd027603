//! Data bridge — connects [`CascadeController`] state to TUI actions.
//!
//! Runs as a background task: subscribes to cascade snapshots and the
//! store's commit counter, forwarding every change as an [`Action`]
//! through the TUI's action channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use akvio_core::{CascadeController, MemoryQueryStore};

use crate::action::Action;

/// Forward cascade snapshots and commit signals until cancelled.
pub async fn spawn_data_bridge(
    controller: CascadeController,
    store: Arc<MemoryQueryStore>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut snapshots = controller.subscribe();
    let mut commits = store.subscribe_commits();

    // Push the initial snapshot so levels render immediately
    let initial = snapshots.borrow_and_update().clone();
    let _ = action_tx.send(Action::SnapshotUpdated(initial));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = snapshots.changed() => {
                let snapshot = snapshots.borrow_and_update().clone();
                let _ = action_tx.send(Action::SnapshotUpdated(snapshot));
            }

            Ok(()) = commits.changed() => {
                let count = *commits.borrow_and_update();
                let _ = action_tx.send(Action::QueryCommitted(count));
            }
        }
    }

    debug!("data bridge shut down");
}
