//! Runtime configuration for sync passes.

use std::time::Duration;

use hazina_core::sync::{
    SYNC_ITEM_LATENCY_MS, SYNC_ITEM_TIMEOUT_ENV, SYNC_ITEM_TIMEOUT_MS, SYNC_LATENCY_ENV,
};
use hazina_core::{Result, SyncError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineSyncConfig {
    /// Delay the simulated transport waits per item.
    pub simulated_latency: Duration,
    /// Bound on a single push; `None` waits indefinitely.
    pub item_timeout: Option<Duration>,
}

impl Default for OfflineSyncConfig {
    fn default() -> Self {
        Self {
            simulated_latency: Duration::from_millis(SYNC_ITEM_LATENCY_MS),
            item_timeout: Some(Duration::from_millis(SYNC_ITEM_TIMEOUT_MS)),
        }
    }
}

impl OfflineSyncConfig {
    /// Defaults overridden by `HAZINA_SYNC_LATENCY_MS` and `HAZINA_SYNC_ITEM_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(latency_ms) = read_millis(&lookup, SYNC_LATENCY_ENV)? {
            config.simulated_latency = Duration::from_millis(latency_ms);
        }
        if let Some(timeout_ms) = read_millis(&lookup, SYNC_ITEM_TIMEOUT_ENV)? {
            config.item_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        }

        Ok(config)
    }
}

fn read_millis<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Ok(None);
    };

    raw.parse::<u64>().map(Some).map_err(|_| {
        SyncError::config(format!(
            "{} must be a whole number of milliseconds, got '{}'",
            key, raw
        ))
    })
}
