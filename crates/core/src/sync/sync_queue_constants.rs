//! Timing defaults for offline sync passes.

/// Simulated network latency per item, in milliseconds.
pub const SYNC_ITEM_LATENCY_MS: u64 = 1_000;

/// Upper bound on a single item push, in milliseconds.
pub const SYNC_ITEM_TIMEOUT_MS: u64 = 30_000;

/// Environment variable overriding the simulated latency.
pub const SYNC_LATENCY_ENV: &str = "HAZINA_SYNC_LATENCY_MS";

/// Environment variable overriding the item timeout. `0` disables it.
pub const SYNC_ITEM_TIMEOUT_ENV: &str = "HAZINA_SYNC_ITEM_TIMEOUT_MS";
