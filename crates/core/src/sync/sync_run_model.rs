//! Sync pass results, status views and emitted events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SyncItemStatus, SyncQueueSnapshot, SyncStatusCounts};
use crate::errors::ItemSyncError;

/// Retry policy classification for item failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRetryClass {
    Retryable,
    Permanent,
}

/// How a sync pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunOutcome {
    /// Every pending item reached a terminal status.
    Completed,
    /// Cancellation was requested between items.
    Cancelled,
    /// Connectivity dropped between items.
    ConnectionLost,
}

/// One item that ended the pass as `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub item_id: String,
    pub message: String,
    pub retry_class: SyncRetryClass,
}

impl ItemFailure {
    pub fn new(item_id: impl Into<String>, error: &ItemSyncError) -> Self {
        Self {
            item_id: item_id.into(),
            message: error.to_string(),
            retry_class: error.retry_class(),
        }
    }
}

/// Summary of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunReport {
    pub outcome: SyncRunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub synced_count: usize,
    pub failures: Vec<ItemFailure>,
    /// Items still `pending` when the pass stopped early.
    pub remaining_pending: usize,
}

impl SyncRunReport {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Some items went through and some did not.
    pub fn is_partial_failure(&self) -> bool {
        self.synced_count > 0 && !self.failures.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == SyncRunOutcome::Completed
    }
}

/// Queue status for the offline page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueStatus {
    pub counts: SyncStatusCounts,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub is_online: bool,
    pub is_running: bool,
}

/// Observable updates emitted while a pass runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncQueueEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted {
        pending_count: usize,
        at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ItemStatusChanged {
        item_id: String,
        from: SyncItemStatus,
        to: SyncItemStatus,
        at: DateTime<Utc>,
        snapshot: SyncQueueSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    RunFinished { report: SyncRunReport },
}
