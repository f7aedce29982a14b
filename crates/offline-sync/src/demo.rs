//! Mocked queue shown on the dashboard's offline page.

use std::sync::Arc;

use chrono::Duration;
use hazina_core::sync::{seed_status, Clock, SyncItem, SyncItemKind, SyncItemStatus, SyncQueue};
use hazina_core::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money transfer captured while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoTransaction {
    pub id: String,
    pub recipient: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Builds the sample queue: one item per kind, oldest first.
///
/// New items start `synced` when online and `pending` when offline; the
/// chama contribution is seeded as a previous failure so the retry
/// affordance has something to show.
pub fn sample_queue(online: bool, clock: &dyn Clock) -> Result<SyncQueue> {
    let now = clock.now();
    let transfer = DemoTransaction {
        id: "txn-2041".to_string(),
        recipient: "Jane Wanjiku".to_string(),
        amount: Decimal::new(150_000, 2),
        currency: "KES".to_string(),
    };
    let payload = Arc::new(serde_json::to_value(&transfer)?);

    let seeds: [(&str, SyncItemKind, &str, i64, Option<SyncItemStatus>); 4] = [
        (
            "sync-txn-2041",
            SyncItemKind::Transaction,
            "Send KES 1,500 to Jane Wanjiku",
            45,
            None,
        ),
        (
            "sync-profile-7",
            SyncItemKind::Profile,
            "Update phone number",
            30,
            None,
        ),
        (
            "sync-chama-12",
            SyncItemKind::Chama,
            "Monthly contribution to Umoja chama",
            20,
            Some(SyncItemStatus::Failed),
        ),
        (
            "sync-invest-3",
            SyncItemKind::Investment,
            "Buy money market fund units",
            5,
            None,
        ),
    ];

    let items = seeds
        .into_iter()
        .map(|(id, kind, description, minutes_ago, previous)| {
            let item = SyncItem::with_id(id, kind, description, now - Duration::minutes(minutes_ago))
                .with_status(seed_status(online, previous));
            if kind == SyncItemKind::Transaction {
                item.with_payload(Arc::clone(&payload))
            } else {
                item
            }
        })
        .collect::<Vec<_>>();

    Ok(SyncQueue::new(items))
}
