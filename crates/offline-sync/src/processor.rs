//! Sync queue processor: sequential push of pending items.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hazina_core::errors::ItemSyncError;
use hazina_core::sync::{
    Clock, ConnectivityProvider, ItemFailure, NoOpSyncEventSink, SyncEventSink, SyncItem,
    SyncItemStatus, SyncQueue, SyncQueueEvent, SyncQueueStatus, SyncRunOutcome, SyncRunReport,
    SyncTransport, SystemClock,
};
use hazina_core::{Result, SyncError};
use log::{debug, info, warn};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::OfflineSyncConfig;
use crate::transport::SimulatedTransport;

pub struct SyncQueueProcessor {
    connectivity: Arc<dyn ConnectivityProvider>,
    transport: Arc<dyn SyncTransport>,
    clock: Arc<dyn Clock>,
    event_sink: Arc<dyn SyncEventSink>,
    item_timeout: Option<Duration>,
    shutdown: CancellationToken,
    /// Held for the whole pass; `try_lock` failing means a pass is in flight.
    pass_mutex: Mutex<()>,
    pass_running: AtomicBool,
    last_sync_time: watch::Sender<Option<DateTime<Utc>>>,
}

impl SyncQueueProcessor {
    pub fn new(
        connectivity: Arc<dyn ConnectivityProvider>,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        let (last_sync_time, _) = watch::channel(None);
        Self {
            connectivity,
            transport,
            clock: Arc::new(SystemClock),
            event_sink: Arc::new(NoOpSyncEventSink),
            item_timeout: OfflineSyncConfig::default().item_timeout,
            shutdown: CancellationToken::new(),
            pass_mutex: Mutex::new(()),
            pass_running: AtomicBool::new(false),
            last_sync_time,
        }
    }

    /// Processor backed by the simulated transport described by `config`.
    pub fn from_config(
        config: &OfflineSyncConfig,
        connectivity: Arc<dyn ConnectivityProvider>,
    ) -> Self {
        let transport = SimulatedTransport::new(config.simulated_latency);
        Self::new(connectivity, Arc::new(transport)).with_item_timeout(config.item_timeout)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the sink that receives every status transition.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn SyncEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn with_item_timeout(mut self, item_timeout: Option<Duration>) -> Self {
        self.item_timeout = item_timeout;
        self
    }

    /// Token that, once cancelled, stops every current and future pass between items.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn is_running(&self) -> bool {
        self.pass_running.load(Ordering::Acquire)
    }

    /// Finish time of the last completed pass.
    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        *self.last_sync_time.borrow()
    }

    pub fn subscribe_last_sync_time(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_sync_time.subscribe()
    }

    pub fn status(&self, queue: &SyncQueue) -> SyncQueueStatus {
        SyncQueueStatus {
            counts: queue.status_counts(),
            last_sync_time: self.last_sync_time(),
            is_online: self.connectivity.is_online(),
            is_running: self.is_running(),
        }
    }

    /// Runs one pass over `queue`, stopping early only on shutdown or connection loss.
    pub async fn run_sync(&self, queue: &mut SyncQueue) -> Result<SyncRunReport> {
        self.run_pass(queue, None).await
    }

    /// Runs one pass over `queue`.
    ///
    /// Pending items are pushed one at a time in queue order. Each goes
    /// `syncing` (emitted before the push starts) and then `synced` or
    /// `failed`; a failure is recorded and the pass moves on. `cancel`, the
    /// shutdown token and connectivity are checked between items, and an
    /// early stop leaves the remaining items `pending`.
    pub async fn run_sync_with_cancel(
        &self,
        queue: &mut SyncQueue,
        cancel: &CancellationToken,
    ) -> Result<SyncRunReport> {
        self.run_pass(queue, Some(cancel)).await
    }

    async fn run_pass(
        &self,
        queue: &mut SyncQueue,
        cancel: Option<&CancellationToken>,
    ) -> Result<SyncRunReport> {
        let _pass_guard = self.pass_mutex.try_lock().map_err(|_| {
            debug!("[OfflineSync] Rejecting sync request: pass already in progress");
            SyncError::SyncInProgress
        })?;
        let _running = RunningFlag::raise(&self.pass_running);

        if !self.connectivity.is_online() {
            info!("[OfflineSync] Skipping sync pass: offline");
            return Err(SyncError::Offline);
        }

        let started = tokio::time::Instant::now();
        let started_at = self.clock.now();
        let pending = queue.pending_indices();
        info!(
            "[OfflineSync] Sync pass started pending={} total={}",
            pending.len(),
            queue.len()
        );
        self.event_sink.emit(SyncQueueEvent::RunStarted {
            pending_count: pending.len(),
            at: started_at,
        });

        let mut outcome = SyncRunOutcome::Completed;
        let mut synced_count = 0;
        let mut failures = Vec::new();

        for index in pending {
            if self.shutdown.is_cancelled() || cancel.is_some_and(|token| token.is_cancelled()) {
                outcome = SyncRunOutcome::Cancelled;
                break;
            }
            if !self.connectivity.is_online() {
                outcome = SyncRunOutcome::ConnectionLost;
                break;
            }

            self.set_status(queue, index, SyncItemStatus::Syncing)?;
            let pushed = self.push_item(&queue.items()[index]).await;
            match pushed {
                Ok(()) => {
                    self.set_status(queue, index, SyncItemStatus::Synced)?;
                    synced_count += 1;
                }
                Err(err) => {
                    let item_id = queue.items()[index].id().to_string();
                    warn!("[OfflineSync] Item {} failed: {}", item_id, err);
                    failures.push(ItemFailure::new(item_id, &err));
                    self.set_status(queue, index, SyncItemStatus::Failed)?;
                }
            }
        }

        let finished_at = self.clock.now();
        if outcome == SyncRunOutcome::Completed {
            self.last_sync_time.send_replace(Some(finished_at));
        }

        let report = SyncRunReport {
            outcome,
            started_at,
            finished_at,
            duration_ms: started.elapsed().as_millis() as i64,
            synced_count,
            failures,
            remaining_pending: queue.status_counts().pending,
        };
        info!(
            "[OfflineSync] Sync pass finished outcome={:?} synced={} failed={} remaining={} duration_ms={}",
            report.outcome,
            report.synced_count,
            report.failed_count(),
            report.remaining_pending,
            report.duration_ms
        );
        self.event_sink.emit(SyncQueueEvent::RunFinished {
            report: report.clone(),
        });

        Ok(report)
    }

    /// Re-enqueues one failed item as `pending`.
    pub fn retry_failed(&self, queue: &mut SyncQueue, item_id: &str) -> Result<()> {
        queue.requeue(item_id)?;
        debug!("[OfflineSync] Item {} requeued", item_id);
        self.emit_status_change(queue, item_id, SyncItemStatus::Failed, SyncItemStatus::Pending);
        Ok(())
    }

    /// Re-enqueues every failed item, returning how many moved.
    pub fn retry_all_failed(&self, queue: &mut SyncQueue) -> usize {
        let failed_ids: Vec<String> = queue
            .items()
            .iter()
            .filter(|item| item.status() == SyncItemStatus::Failed)
            .map(|item| item.id().to_string())
            .collect();

        let mut requeued = 0;
        for item_id in failed_ids {
            if self.retry_failed(queue, &item_id).is_ok() {
                requeued += 1;
            }
        }
        requeued
    }

    async fn push_item(&self, item: &SyncItem) -> std::result::Result<(), ItemSyncError> {
        match self.item_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.push(item))
                .await
                .unwrap_or_else(|_| Err(ItemSyncError::Timeout(limit.as_millis() as u64))),
            None => self.transport.push(item).await,
        }
    }

    fn set_status(&self, queue: &mut SyncQueue, index: usize, next: SyncItemStatus) -> Result<()> {
        let previous = queue.transition_at(index, next)?;
        let item_id = queue.items()[index].id().to_string();
        debug!("[OfflineSync] Item {} {} -> {}", item_id, previous, next);
        self.emit_status_change(queue, &item_id, previous, next);
        Ok(())
    }

    fn emit_status_change(
        &self,
        queue: &SyncQueue,
        item_id: &str,
        from: SyncItemStatus,
        to: SyncItemStatus,
    ) {
        self.event_sink.emit(SyncQueueEvent::ItemStatusChanged {
            item_id: item_id.to_string(),
            from,
            to,
            at: self.clock.now(),
            snapshot: queue.snapshot(),
        });
    }
}

/// Marks a pass as running for as long as it is alive.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::NetworkStatus;
    use crate::transport::FailurePolicy;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use hazina_core::sync::{FixedClock, StaticConnectivity, SyncItemKind};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingSink {
        events: StdMutex<Vec<SyncQueueEvent>>,
    }

    impl RecordingSink {
        fn transitions(&self) -> Vec<(String, SyncItemStatus, SyncItemStatus)> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|event| match event {
                    SyncQueueEvent::ItemStatusChanged { item_id, from, to, .. } => {
                        Some((item_id.clone(), *from, *to))
                    }
                    _ => None,
                })
                .collect()
        }
    }

    impl SyncEventSink for RecordingSink {
        fn emit(&self, event: SyncQueueEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Transport that never answers.
    struct HangingTransport;

    #[async_trait]
    impl SyncTransport for HangingTransport {
        async fn push(&self, _item: &SyncItem) -> std::result::Result<(), ItemSyncError> {
            std::future::pending().await
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn item(id: &str, status: SyncItemStatus) -> SyncItem {
        SyncItem::with_id(id, SyncItemKind::Transaction, format!("item {id}"), now())
            .with_status(status)
    }

    fn scenario_queue() -> SyncQueue {
        SyncQueue::new(vec![
            item("1", SyncItemStatus::Pending),
            item("2", SyncItemStatus::Synced),
            item("3", SyncItemStatus::Pending),
        ])
    }

    fn processor(
        online: bool,
        failure_policy: FailurePolicy,
        sink: Arc<RecordingSink>,
    ) -> SyncQueueProcessor {
        let transport = SimulatedTransport::new(Duration::from_secs(1))
            .with_failure_policy(failure_policy);
        SyncQueueProcessor::new(Arc::new(StaticConnectivity(online)), Arc::new(transport))
            .with_clock(Arc::new(FixedClock(now())))
            .with_event_sink(sink)
    }

    fn statuses(queue: &SyncQueue) -> Vec<SyncItemStatus> {
        queue.items().iter().map(|item| item.status()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn online_pass_syncs_pending_and_skips_terminal_items() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Never, sink.clone());
        let mut queue = scenario_queue();

        let report = processor.run_sync(&mut queue).await.unwrap();

        assert_eq!(
            statuses(&queue),
            vec![
                SyncItemStatus::Synced,
                SyncItemStatus::Synced,
                SyncItemStatus::Synced
            ]
        );
        assert_eq!(report.outcome, SyncRunOutcome::Completed);
        assert_eq!(report.synced_count, 2);
        assert_eq!(report.remaining_pending, 0);
        assert!(report.duration_ms >= 2_000);
        assert_eq!(processor.last_sync_time(), Some(now()));
        assert!(sink.transitions().iter().all(|(id, _, _)| id != "2"));
    }

    #[tokio::test(start_paused = true)]
    async fn offline_pass_changes_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(false, FailurePolicy::Never, sink.clone());
        let mut queue = scenario_queue();
        let before = queue.clone();

        let err = processor.run_sync(&mut queue).await.unwrap_err();

        assert!(matches!(err, SyncError::Offline));
        assert_eq!(queue, before);
        assert_eq!(processor.last_sync_time(), None);
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn items_go_through_syncing_one_at_a_time_in_order() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Never, sink.clone());
        let mut queue = scenario_queue();

        processor.run_sync(&mut queue).await.unwrap();

        assert_eq!(
            sink.transitions(),
            vec![
                ("1".to_string(), SyncItemStatus::Pending, SyncItemStatus::Syncing),
                ("1".to_string(), SyncItemStatus::Syncing, SyncItemStatus::Synced),
                ("3".to_string(), SyncItemStatus::Pending, SyncItemStatus::Syncing),
                ("3".to_string(), SyncItemStatus::Syncing, SyncItemStatus::Synced),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn syncing_is_observable_before_the_push_completes() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Never, sink.clone());
        let mut queue = scenario_queue();

        processor.run_sync(&mut queue).await.unwrap();

        let events = sink.events.lock().unwrap();
        let first_snapshot = events
            .iter()
            .find_map(|event| match event {
                SyncQueueEvent::ItemStatusChanged { snapshot, .. } => Some(snapshot.clone()),
                _ => None,
            })
            .expect("status event");
        assert_eq!(first_snapshot[0].status(), SyncItemStatus::Syncing);
        assert_eq!(first_snapshot[2].status(), SyncItemStatus::Pending);
        assert!(matches!(
            events.last(),
            Some(SyncQueueEvent::RunFinished { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_item_does_not_block_later_items() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::items(["1"]), sink);
        let mut queue = scenario_queue();

        let report = processor.run_sync(&mut queue).await.unwrap();

        assert_eq!(
            statuses(&queue),
            vec![
                SyncItemStatus::Failed,
                SyncItemStatus::Synced,
                SyncItemStatus::Synced
            ]
        );
        assert!(report.is_partial_failure());
        assert_eq!(report.failures[0].item_id, "1");
        assert!(report.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_push_times_out_as_failed() {
        let processor = SyncQueueProcessor::new(
            Arc::new(StaticConnectivity(true)),
            Arc::new(HangingTransport),
        )
        .with_item_timeout(Some(Duration::from_secs(5)));
        let mut queue = SyncQueue::new(vec![item("1", SyncItemStatus::Pending)]);

        let report = processor.run_sync(&mut queue).await.unwrap();

        assert_eq!(statuses(&queue), vec![SyncItemStatus::Failed]);
        assert_eq!(report.failures[0].message, "Timed out after 5000 ms");
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_items_are_never_touched() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Always, sink.clone());
        let mut queue = SyncQueue::new(vec![
            item("a", SyncItemStatus::Synced),
            item("b", SyncItemStatus::Failed),
        ]);
        let before = queue.clone();

        let report = processor.run_sync(&mut queue).await.unwrap();

        assert_eq!(queue, before);
        assert!(sink.transitions().is_empty());
        assert_eq!(report.synced_count, 0);
        assert!(processor.last_sync_time().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn second_pass_is_rejected_while_one_is_in_flight() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Never, sink.clone());
        let mut first = scenario_queue();
        let mut second = scenario_queue();
        let untouched = second.clone();

        let (first_result, second_result) = tokio::join!(processor.run_sync(&mut first), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(processor.is_running());
            processor.run_sync(&mut second).await
        });

        assert!(first_result.unwrap().is_completed());
        assert!(matches!(second_result, Err(SyncError::SyncInProgress)));
        assert_eq!(second, untouched);
        assert_eq!(sink.transitions().len(), 4);
        assert!(!processor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_between_items_leaves_rest_pending() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Never, sink);
        let mut queue = scenario_queue();
        let cancel = CancellationToken::new();

        let (report, _) = tokio::join!(processor.run_sync_with_cancel(&mut queue, &cancel), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            cancel.cancel();
        });
        let report = report.unwrap();

        assert_eq!(report.outcome, SyncRunOutcome::Cancelled);
        assert_eq!(
            statuses(&queue),
            vec![
                SyncItemStatus::Synced,
                SyncItemStatus::Synced,
                SyncItemStatus::Pending
            ]
        );
        assert_eq!(report.remaining_pending, 1);
        assert_eq!(processor.last_sync_time(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn going_offline_mid_pass_stops_before_next_item() {
        let network = NetworkStatus::new(true);
        let transport = SimulatedTransport::new(Duration::from_secs(1));
        let processor = SyncQueueProcessor::new(Arc::new(network.clone()), Arc::new(transport));
        let mut queue = scenario_queue();

        let (report, _) = tokio::join!(processor.run_sync(&mut queue), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            network.set_online(false);
        });
        let report = report.unwrap();

        assert_eq!(report.outcome, SyncRunOutcome::ConnectionLost);
        assert_eq!(queue.items()[0].status(), SyncItemStatus::Synced);
        assert_eq!(queue.items()[2].status(), SyncItemStatus::Pending);
        assert!(!processor.status(&queue).is_online);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_requeues_failed_items_for_the_next_pass() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Never, sink.clone());
        let mut queue = SyncQueue::new(vec![
            item("1", SyncItemStatus::Failed),
            item("2", SyncItemStatus::Synced),
            item("3", SyncItemStatus::Failed),
        ]);

        assert!(matches!(
            processor.retry_failed(&mut queue, "2"),
            Err(SyncError::InvalidTransition { .. })
        ));
        processor.retry_failed(&mut queue, "1").unwrap();
        assert_eq!(processor.retry_all_failed(&mut queue), 1);
        assert_eq!(processor.status(&queue).counts.pending, 2);

        processor.run_sync(&mut queue).await.unwrap();
        assert_eq!(queue.status_counts().synced, 3);
        assert_eq!(
            sink.transitions()[0],
            ("1".to_string(), SyncItemStatus::Failed, SyncItemStatus::Pending)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn status_reads_never_block_back_to_back_passes() {
        let processor = Arc::new(SyncQueueProcessor::new(
            Arc::new(StaticConnectivity(true)),
            Arc::new(SimulatedTransport::new(Duration::ZERO)),
        ));
        let stop = Arc::new(AtomicBool::new(false));

        let reader = {
            let processor = Arc::clone(&processor);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut reads = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    let _ = processor.is_running();
                    let _ = processor.status(&SyncQueue::default());
                    reads += 1;
                }
                reads
            })
        };

        let mut queue = SyncQueue::default();
        for _ in 0..20_000 {
            processor
                .run_sync(&mut queue)
                .await
                .expect("no pass is in flight");
        }
        stop.store(true, Ordering::Relaxed);

        assert!(reader.join().expect("reader thread") > 0);
        assert!(!processor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn last_sync_time_subscribers_only_see_completed_passes() {
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(true, FailurePolicy::Never, sink);
        let mut last_sync = processor.subscribe_last_sync_time();
        let mut queue = scenario_queue();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = processor
            .run_sync_with_cancel(&mut queue, &cancel)
            .await
            .unwrap();
        assert_eq!(report.outcome, SyncRunOutcome::Cancelled);
        assert!(!last_sync.has_changed().unwrap());
        assert_eq!(*last_sync.borrow(), None);

        processor.run_sync(&mut queue).await.unwrap();
        assert!(last_sync.has_changed().unwrap());
        assert_eq!(*last_sync.borrow_and_update(), Some(now()));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_token_cancels_future_passes() {
        let shutdown = CancellationToken::new();
        let processor = SyncQueueProcessor::from_config(
            &OfflineSyncConfig::default(),
            Arc::new(StaticConnectivity(true)),
        )
        .with_shutdown(shutdown.clone());
        shutdown.cancel();
        let mut queue = scenario_queue();

        let report = processor.run_sync(&mut queue).await.unwrap();

        assert_eq!(report.outcome, SyncRunOutcome::Cancelled);
        assert_eq!(report.remaining_pending, 2);
    }
}
