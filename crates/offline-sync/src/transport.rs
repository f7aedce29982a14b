//! Simulated network transport.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use hazina_core::errors::ItemSyncError;
use hazina_core::sync::{SyncItem, SyncTransport};

/// Which items the simulated transport refuses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Never,
    Always,
    Items(HashSet<String>),
}

impl FailurePolicy {
    pub fn items<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Items(ids.into_iter().map(Into::into).collect())
    }

    fn fails(&self, item_id: &str) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::Items(ids) => ids.contains(item_id),
        }
    }
}

/// Waits a fixed latency per item, then succeeds unless the policy says otherwise.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    latency: Duration,
    failure_policy: FailurePolicy,
}

impl SimulatedTransport {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failure_policy: FailurePolicy::Never,
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

#[async_trait]
impl SyncTransport for SimulatedTransport {
    async fn push(&self, item: &SyncItem) -> Result<(), ItemSyncError> {
        tokio::time::sleep(self.latency).await;
        if self.failure_policy.fails(item.id()) {
            return Err(ItemSyncError::network(format!(
                "simulated failure for {}",
                item.id()
            )));
        }
        Ok(())
    }
}
