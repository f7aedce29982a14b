//! Sync item and queue models.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, SyncError};

/// Kind of locally queued work. Classification only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncItemKind {
    Transaction,
    Profile,
    Chama,
    Investment,
}

/// Item lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncItemStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl SyncItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Failed => "failed",
        }
    }

    /// `synced` and `failed` never advance on their own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Synced | Self::Failed)
    }

    /// Edges of the automatic state machine.
    pub fn can_transition_to(&self, next: SyncItemStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Syncing)
                | (Self::Syncing, Self::Synced)
                | (Self::Syncing, Self::Failed)
        )
    }
}

impl fmt::Display for SyncItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status a mocked or restored item should start in.
///
/// Terminal statuses are kept, an item caught mid-flight goes back to
/// `pending`, and a brand new item counts as delivered only when online.
pub fn seed_status(online: bool, previous: Option<SyncItemStatus>) -> SyncItemStatus {
    match previous {
        Some(SyncItemStatus::Synced) => SyncItemStatus::Synced,
        Some(SyncItemStatus::Failed) => SyncItemStatus::Failed,
        Some(SyncItemStatus::Syncing) | Some(SyncItemStatus::Pending) => SyncItemStatus::Pending,
        None if online => SyncItemStatus::Synced,
        None => SyncItemStatus::Pending,
    }
}

/// A unit of locally queued work awaiting transmission.
///
/// Everything except `status` is fixed at creation, and `status` only moves
/// through [`SyncItem::transition_to`] and [`SyncItem::requeue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItem {
    id: String,
    kind: SyncItemKind,
    description: String,
    created_at: DateTime<Utc>,
    status: SyncItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Arc<serde_json::Value>>,
}

impl SyncItem {
    /// Creates a pending item with a fresh UUID.
    pub fn new(
        kind: SyncItemKind,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), kind, description, created_at)
    }

    pub fn with_id(
        id: impl Into<String>,
        kind: SyncItemKind,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            description: description.into(),
            created_at,
            status: SyncItemStatus::Pending,
            payload: None,
        }
    }

    /// Seeds the starting status. Creation-time only; use transitions afterwards.
    pub fn with_status(mut self, status: SyncItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_payload(mut self, payload: Arc<serde_json::Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SyncItemKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> SyncItemStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&Arc<serde_json::Value>> {
        self.payload.as_ref()
    }

    /// Moves along one edge of the state machine, returning the previous status.
    pub fn transition_to(&mut self, next: SyncItemStatus) -> Result<SyncItemStatus> {
        if !self.status.can_transition_to(next) {
            return Err(SyncError::invalid_transition(&self.id, self.status, next));
        }
        let previous = self.status;
        self.status = next;
        Ok(previous)
    }

    /// Explicit retry: puts a failed item back to `pending`.
    pub fn requeue(&mut self) -> Result<()> {
        if self.status != SyncItemStatus::Failed {
            return Err(SyncError::invalid_transition(
                &self.id,
                self.status,
                SyncItemStatus::Pending,
            ));
        }
        self.status = SyncItemStatus::Pending;
        Ok(())
    }
}

/// Item counts per status, as shown on the offline page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusCounts {
    pub pending: usize,
    pub syncing: usize,
    pub synced: usize,
    pub failed: usize,
}

impl SyncStatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.syncing + self.synced + self.failed
    }
}

/// Immutable view of a queue at one point of a pass.
pub type SyncQueueSnapshot = Arc<[SyncItem]>;

/// Ordered sequence of sync items. Order is processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncQueue {
    items: Vec<SyncItem>,
}

impl SyncQueue {
    pub fn new(items: Vec<SyncItem>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: SyncItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[SyncItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SyncItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut SyncItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Moves the item at `index` along one state machine edge, returning the previous status.
    pub fn transition_at(&mut self, index: usize, next: SyncItemStatus) -> Result<SyncItemStatus> {
        self.items
            .get_mut(index)
            .ok_or_else(|| SyncError::ItemNotFound(format!("#{}", index)))?
            .transition_to(next)
    }

    /// Positions of pending items, in queue order.
    pub fn pending_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.status == SyncItemStatus::Pending)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn status_counts(&self) -> SyncStatusCounts {
        let mut counts = SyncStatusCounts::default();
        for item in &self.items {
            match item.status {
                SyncItemStatus::Pending => counts.pending += 1,
                SyncItemStatus::Syncing => counts.syncing += 1,
                SyncItemStatus::Synced => counts.synced += 1,
                SyncItemStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn snapshot(&self) -> SyncQueueSnapshot {
        Arc::from(self.items.as_slice())
    }

    /// Requeues one failed item.
    pub fn requeue(&mut self, id: &str) -> Result<()> {
        self.get_mut(id)
            .ok_or_else(|| SyncError::ItemNotFound(id.to_string()))?
            .requeue()
    }
}

impl From<Vec<SyncItem>> for SyncQueue {
    fn from(items: Vec<SyncItem>) -> Self {
        Self::new(items)
    }
}
