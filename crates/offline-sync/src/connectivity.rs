//! Externally updated connectivity flag.

use std::sync::Arc;

use hazina_core::sync::ConnectivityProvider;
use log::info;
use tokio::sync::watch;

/// Network status shared between the platform listener and the processor.
#[derive(Debug, Clone)]
pub struct NetworkStatus {
    tx: Arc<watch::Sender<bool>>,
}

impl NetworkStatus {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.tx.send_replace(online);
        if previous != online {
            info!(
                "[OfflineSync] Connectivity changed: {}",
                if online { "online" } else { "offline" }
            );
        }
    }

    /// Receiver notified on every connectivity change.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl ConnectivityProvider for NetworkStatus {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }
}
