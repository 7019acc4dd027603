// ── Query store ──
//
// Holds the persisted selection and signals dependent recomputation.
// The controller never keeps selection state of its own; level values
// are views derived from what lives here.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::debug;

use crate::model::{PersistedSelection, SelectionPatch};

/// External collaborator persisting the selection.
///
/// `update` merges a field patch into the stored record; `commit`
/// signals that dependent computation (e.g. re-running the panel query)
/// should happen. The two are separate because a hard reset updates the
/// record without triggering a query run.
pub trait QueryStore: Send + Sync {
    /// Current persisted selection.
    fn current(&self) -> PersistedSelection;

    /// Merge a patch into the persisted selection.
    fn update(&self, patch: SelectionPatch);

    /// Signal dependent recomputation.
    fn commit(&self);
}

/// In-process [`QueryStore`] backed by a mutex.
///
/// Commits bump a `watch` counter so hosts (and tests) can observe how
/// often dependent recomputation was requested.
pub struct MemoryQueryStore {
    selection: Mutex<PersistedSelection>,
    commits: watch::Sender<u64>,
}

impl MemoryQueryStore {
    pub fn new(selection: PersistedSelection) -> Self {
        let (commits, _) = watch::channel(0u64);
        Self {
            selection: Mutex::new(selection),
            commits,
        }
    }

    /// Subscribe to commit signals. The value is a monotonic counter.
    pub fn subscribe_commits(&self) -> watch::Receiver<u64> {
        self.commits.subscribe()
    }

    /// Number of commits so far.
    pub fn commit_count(&self) -> u64 {
        *self.commits.borrow()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PersistedSelection> {
        // Selection state is plain data; a poisoned lock only happens if a
        // panic escaped mid-update, in which case the data is still usable.
        self.selection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryQueryStore {
    fn default() -> Self {
        Self::new(PersistedSelection::default())
    }
}

impl QueryStore for MemoryQueryStore {
    fn current(&self) -> PersistedSelection {
        self.lock().clone()
    }

    fn update(&self, patch: SelectionPatch) {
        let mut selection = self.lock();
        selection.apply(patch);
        debug_assert!(selection.is_consistent(), "selection patch broke dependency order");
    }

    fn commit(&self) {
        self.commits.send_modify(|n| *n += 1);
        debug!(commits = *self.commits.borrow(), "query commit signalled");
    }
}
