//! Error types for the offline sync queue.

use thiserror::Error;

use crate::sync::{SyncItemStatus, SyncRetryClass};

/// Result type alias for sync queue operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised by queue-level sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Connectivity provider reports the remote side as unreachable
    #[error("Cannot sync while offline")]
    Offline,

    /// Another sync pass is already running on this processor
    #[error("A sync pass is already in progress")]
    SyncInProgress,

    /// No item with the given id exists in the queue
    #[error("Sync item not found: {0}")]
    ItemNotFound(String),

    /// Status change outside the item state machine
    #[error("Invalid transition for item {item_id}: {from} -> {to}")]
    InvalidTransition {
        item_id: String,
        from: SyncItemStatus,
        to: SyncItemStatus,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create an invalid transition error
    pub fn invalid_transition(
        item_id: impl Into<String>,
        from: SyncItemStatus,
        to: SyncItemStatus,
    ) -> Self {
        Self::InvalidTransition {
            item_id: item_id.into(),
            from,
            to,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Failure of a single item push. Recorded against the item, never fatal to the pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemSyncError {
    /// Transport could not reach the remote side
    #[error("Network error: {0}")]
    Network(String),

    /// Remote side refused the item
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Push did not complete within the per-item timeout
    #[error("Timed out after {0} ms")]
    Timeout(u64),
}

impl ItemSyncError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> SyncRetryClass {
        match self {
            Self::Network(_) | Self::Timeout(_) => SyncRetryClass::Retryable,
            Self::Rejected(_) => SyncRetryClass::Permanent,
        }
    }
}
