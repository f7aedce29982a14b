//! Broadcast sink for sync pass updates.

use hazina_core::sync::{SyncEventSink, SyncQueueEvent};
use tokio::sync::broadcast;

/// Default buffer for slow subscribers before they start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Fans sync events out to any number of subscribers (render layer, logs).
#[derive(Debug, Clone)]
pub struct ChannelSyncEventSink {
    tx: broadcast::Sender<SyncQueueEvent>,
}

impl ChannelSyncEventSink {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncQueueEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChannelSyncEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncEventSink for ChannelSyncEventSink {
    fn emit(&self, event: SyncQueueEvent) {
        // No subscribers is not an error
        let _ = self.tx.send(event);
    }
}
