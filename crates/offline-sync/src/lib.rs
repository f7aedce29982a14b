//! Offline sync queue runtime.
//!
//! [`SyncQueueProcessor`] drives queued items through
//! `pending → syncing → synced | failed`, one at a time and in queue order,
//! while the device is online. Network latency is simulated by
//! [`SimulatedTransport`]; observers follow progress through a
//! [`ChannelSyncEventSink`].

mod config;
mod connectivity;
pub mod demo;
mod events;
mod processor;
mod transport;

pub use config::OfflineSyncConfig;
pub use connectivity::NetworkStatus;
pub use events::ChannelSyncEventSink;
pub use processor::SyncQueueProcessor;
pub use transport::{FailurePolicy, SimulatedTransport};

// Re-export the domain surface so consumers need a single dependency
pub use hazina_core::sync::*;
pub use hazina_core::errors::ItemSyncError;
pub use hazina_core::{Result, SyncError};
