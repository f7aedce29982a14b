//! Contracts for the collaborators a sync pass consumes and serves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{SyncItem, SyncQueueEvent};
use crate::errors::ItemSyncError;

/// Reports whether the remote side is currently reachable.
pub trait ConnectivityProvider: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct StaticConnectivity(pub bool);

impl ConnectivityProvider for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Wall-clock source for sync timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Delivers one item to the remote side.
///
/// The processor never retries on its own; an error marks the item `failed`.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn push(&self, item: &SyncItem) -> Result<(), ItemSyncError>;
}

/// Receives every update emitted during a sync pass.
pub trait SyncEventSink: Send + Sync {
    fn emit(&self, event: SyncQueueEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSyncEventSink;

impl SyncEventSink for NoOpSyncEventSink {
    fn emit(&self, _event: SyncQueueEvent) {}
}
