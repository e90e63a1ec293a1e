//! Network reachability as reported by the host platform

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Shared online/offline flag. Front ends report transitions here; the health
/// manager watches it and re-evaluates immediately instead of waiting a tick.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Record the current reachability. Returns whether it changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online = online, "Network connectivity changed");
        }
        changed
    }

    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}
