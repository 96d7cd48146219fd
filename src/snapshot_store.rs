//! Holder for the last-known-good dashboard snapshot.

use crate::snapshot::ViewSnapshot;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe holder for the current [`ViewSnapshot`].
///
/// Exactly one snapshot exists at a time. `replace` swaps the whole value in
/// a single assignment, so a concurrent `get` observes either the previous or
/// the next snapshot, never a mix. No history is kept.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    snapshot: Arc<ViewSnapshot>,
    applied_cycles: u64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                snapshot: Arc::new(ViewSnapshot::empty()),
                applied_cycles: 0,
            })),
        }
    }

    /// Returns the current snapshot.
    pub async fn get(&self) -> Arc<ViewSnapshot> {
        let inner = self.inner.read().await;
        Arc::clone(&inner.snapshot)
    }

    /// Swaps in a new snapshot wholesale.
    pub async fn replace(&self, snapshot: ViewSnapshot) {
        let mut inner = self.inner.write().await;
        inner.snapshot = Arc::new(snapshot);
        inner.applied_cycles += 1;
    }

    /// True until the first successful cycle has been applied.
    ///
    /// Distinguishes "no data yet" from the empty initial snapshot, which is
    /// a real value a viewer may render.
    pub async fn is_loading(&self) -> bool {
        self.applied_cycles().await == 0
    }

    /// Number of snapshots applied since creation.
    pub async fn applied_cycles(&self) -> u64 {
        let inner = self.inner.read().await;
        inner.applied_cycles
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
