use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Network reachability as last reported by the platform layer.
///
/// Level state, not an event log: consumers read the latest known value
/// (which may lag the platform's own detection) or subscribe to changes;
/// missed transitions are not replayed. Cheap to clone — all clones share
/// the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    reachable: Arc<AtomicBool>,
    changes: watch::Sender<bool>,
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("reachable", &self.is_reachable())
            .finish()
    }
}

impl ConnectivityMonitor {
    pub fn new(initially_reachable: bool) -> Self {
        let (changes, _) = watch::channel(initially_reachable);
        Self {
            reachable: Arc::new(AtomicBool::new(initially_reachable)),
            changes,
        }
    }

    /// Latest known reachability.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    /// Called by the platform network stack when reachability changes.
    pub fn set_reachable(&self, reachable: bool) {
        let previous = self.reachable.swap(reachable, Ordering::AcqRel);
        if previous != reachable {
            let _ = self.changes.send(reachable);
        }
    }

    /// Subscribe to reachability changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.changes.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
