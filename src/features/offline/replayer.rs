//! Sync replayer for queued operations.
//!
//! Drains the queue against the backend in enqueue order and stops at the
//! first failure. A later operation may depend on an earlier one (a pickup
//! of a package whose intake is still queued), so nothing is attempted past
//! a failed operation. Every failure is treated the same way, which means
//! a permanently rejected operation blocks the queue until it is cleared.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::events::{EventBus, OfflineEvent};
use super::network::NetworkObserver;
use super::operation::{Operation, QueuedOperation};
use super::queue::OperationQueue;
use crate::api::Backend;
use crate::error::MailroomError;

/// Why a pass did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The host reports no connectivity.
    Offline,
    /// Nothing is queued.
    EmptyQueue,
    /// Another pass is still in flight.
    AlreadyRunning,
}

/// The operation a pass stopped at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncHalt {
    /// Operation ID
    pub id: String,
    /// Operation type tag
    pub operation_type: String,
    /// Error message
    pub error: String,
}

/// Result of one replay pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Operations in the snapshot taken at the start of the pass
    pub attempted: usize,
    /// Operations the backend accepted
    pub synced: usize,
    /// Operations still queued after the pass
    pub remaining: usize,
    /// Where the pass stopped, if it stopped early
    pub halted: Option<SyncHalt>,
    /// Why the pass did not run, if it did not
    pub skipped: Option<SkipReason>,
}

impl SyncReport {
    /// A pass that did not run.
    #[must_use]
    pub const fn skipped(reason: SkipReason, remaining: usize) -> Self {
        Self {
            attempted: 0,
            synced: 0,
            remaining,
            halted: None,
            skipped: Some(reason),
        }
    }

    /// Whether the whole snapshot was sent.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.skipped.is_none() && self.halted.is_none()
    }
}

/// Clears the in-flight flag even if the pass is dropped midway.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Replays queued operations against the backend.
#[derive(Clone)]
pub struct SyncReplayer {
    queue: OperationQueue,
    backend: Arc<dyn Backend>,
    network: NetworkObserver,
    events: EventBus,
    in_flight: Arc<AtomicBool>,
}

impl SyncReplayer {
    /// Create a replayer.
    #[must_use]
    pub fn new(
        queue: OperationQueue,
        backend: Arc<dyn Backend>,
        network: NetworkObserver,
        events: EventBus,
    ) -> Self {
        Self {
            queue,
            backend,
            network,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run one replay pass.
    ///
    /// Operations enqueued while the pass runs wait for the next one.
    pub async fn replay(&self) -> SyncReport {
        if !self.network.is_online() {
            debug!("Offline, skipping replay");
            return SyncReport::skipped(SkipReason::Offline, self.queue.count());
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Replay already in flight");
            return SyncReport::skipped(SkipReason::AlreadyRunning, self.queue.count());
        }
        let _guard = PassGuard(&self.in_flight);

        let snapshot = self.queue.list();
        if snapshot.is_empty() {
            return SyncReport::skipped(SkipReason::EmptyQueue, 0);
        }

        let mut synced = Vec::with_capacity(snapshot.len());
        let mut halted = None;

        for operation in &snapshot {
            match self.dispatch(operation).await {
                Ok(()) => {
                    debug!(op_id = %operation.id, "Replayed operation");
                    synced.push(operation.id.clone());
                },
                Err(e) => {
                    if matches!(
                        e,
                        MailroomError::UnknownOperation(_) | MailroomError::InvalidPayload { .. }
                    ) {
                        error!(op_id = %operation.id, error = %e, "Queue holds an operation this build cannot send");
                    } else {
                        warn!(op_id = %operation.id, error = %e, "Replay halted");
                    }
                    halted = Some(SyncHalt {
                        id: operation.id.clone(),
                        operation_type: operation.op_type.clone(),
                        error: e.to_string(),
                    });
                    break;
                },
            }
        }

        if !synced.is_empty() {
            if let Err(e) = self.queue.remove(&synced) {
                error!(error = %e, "Could not remove replayed operations; they will be sent again");
            }
            if let Err(e) = self.queue.record_sync(Utc::now()) {
                warn!(error = %e, "Could not record sync time");
            }
            info!(synced = synced.len(), "Sync complete");
            self.events.publish(OfflineEvent::SyncComplete {
                synced: synced.len(),
            });
        }

        SyncReport {
            attempted: snapshot.len(),
            synced: synced.len(),
            remaining: self.queue.count(),
            halted,
            skipped: None,
        }
    }

    async fn dispatch(&self, operation: &QueuedOperation) -> Result<(), MailroomError> {
        self.send(&operation.decode()?).await
    }

    /// Send a single operation to the backend.
    ///
    /// # Errors
    ///
    /// Returns whatever the backend call returned.
    pub async fn send(&self, operation: &Operation) -> Result<(), MailroomError> {
        match operation {
            Operation::PackageIntake(intake) => self.backend.create_package(intake).await,
            Operation::PackagePickup(pickup) => self.backend.process_pickup(pickup).await,
            Operation::SignatureCapture(signature) => {
                self.backend.capture_signature(signature).await
            },
        }
    }
}

/// Format a sync report for display.
#[must_use]
pub fn format_sync_report(report: &SyncReport) -> String {
    if let Some(reason) = report.skipped {
        return match reason {
            SkipReason::Offline => format!(
                "Offline: {} operations waiting for connectivity.",
                report.remaining
            ),
            SkipReason::EmptyQueue => "No pending operations to sync.".to_string(),
            SkipReason::AlreadyRunning => "A sync is already in progress.".to_string(),
        };
    }

    let mut lines = Vec::new();

    lines.push(format!("Sync pass: {} operations", report.attempted));
    lines.push("─".repeat(40));

    if report.synced > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} synced", report.synced).green()
        ));
    }

    if report.remaining > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} still pending", report.remaining).yellow()
        ));
    }

    if let Some(halt) = &report.halted {
        lines.push(String::new());
        lines.push(format!(
            "  {} stopped at {} ({}): {}",
            "✗".red(),
            halt.id,
            halt.operation_type,
            halt.error.red()
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::api::{Mailbox, MockBackend, PackageIntake, PackagePickup, SignatureCapture};
    use crate::features::offline::queue::PENDING_KEY;
    use crate::storage::Database;

    /// Records every write in arrival order and fails the ones asked to.
    #[derive(Default)]
    struct RecordingBackend {
        received: Mutex<Vec<String>>,
        fail_on: Vec<String>,
        hang_on: Vec<String>,
        enqueue_on_first_write: Mutex<Option<(OperationQueue, Operation)>>,
    }

    impl RecordingBackend {
        fn failing(fail_on: &[&str]) -> Self {
            Self {
                fail_on: fail_on.iter().map(ToString::to_string).collect(),
                ..Self::default()
            }
        }

        fn received(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }

        async fn record(&self, key: String) -> Result<(), MailroomError> {
            self.received.lock().unwrap().push(key.clone());
            let late = self.enqueue_on_first_write.lock().unwrap().take();
            if let Some((queue, operation)) = late {
                queue.enqueue(&operation).unwrap();
            }
            if self.hang_on.contains(&key) {
                pending::<()>().await;
            }
            if self.fail_on.contains(&key) {
                return Err(MailroomError::Network("connection reset".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Backend for RecordingBackend {
        async fn create_package(&self, intake: &PackageIntake) -> Result<(), MailroomError> {
            self.record(intake.tracking_number.clone()).await
        }

        async fn process_pickup(&self, pickup: &PackagePickup) -> Result<(), MailroomError> {
            self.record(format!("pickup:{}", pickup.pickup_person_name)).await
        }

        async fn capture_signature(
            &self,
            signature: &SignatureCapture,
        ) -> Result<(), MailroomError> {
            self.record(format!("signature:{}", signature.package_id)).await
        }

        async fn fetch_mailboxes(&self) -> Result<Vec<Mailbox>, MailroomError> {
            Ok(Vec::new())
        }
    }

    struct Harness {
        queue: OperationQueue,
        network: NetworkObserver,
        events: EventBus,
        db: Database,
    }

    impl Harness {
        fn new(online: bool) -> Self {
            let db = Database::open_in_memory().unwrap();
            let events = EventBus::new();
            Self {
                queue: OperationQueue::new(db.clone(), events.clone()),
                network: NetworkObserver::new(online, events.clone()),
                events,
                db,
            }
        }

        fn replayer(&self, backend: Arc<dyn Backend>) -> SyncReplayer {
            SyncReplayer::new(
                self.queue.clone(),
                backend,
                self.network.clone(),
                self.events.clone(),
            )
        }

        fn intake(&self, tracking: &str) -> String {
            self.queue
                .enqueue(&Operation::PackageIntake(PackageIntake {
                    tracking_number: tracking.to_string(),
                    tenant_id: 42,
                    carrier: None,
                }))
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_replays_in_enqueue_order() {
        let harness = Harness::new(true);
        for tracking in ["A", "B", "C", "D", "E"] {
            harness.intake(tracking);
        }
        harness
            .queue
            .enqueue(&Operation::PackagePickup(PackagePickup {
                package_ids: vec![1],
                tenant_id: 42,
                pickup_person_name: "Ada".to_string(),
                signature_data: "sig".to_string(),
            }))
            .unwrap();
        harness
            .queue
            .enqueue(&Operation::SignatureCapture(SignatureCapture {
                package_id: 1,
                signature_data: "sig".to_string(),
                captured_at: None,
            }))
            .unwrap();

        let backend = Arc::new(RecordingBackend::default());
        let report = harness.replayer(backend.clone()).replay().await;

        assert_eq!(
            backend.received(),
            ["A", "B", "C", "D", "E", "pickup:Ada", "signature:1"]
        );
        assert_eq!(report.synced, 7);
        assert_eq!(report.remaining, 0);
        assert!(report.is_complete());
        assert!(harness.queue.last_sync().is_some());
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let harness = Harness::new(true);
        harness.intake("A");
        let b = harness.intake("B");
        let c = harness.intake("C");
        let mut rx = harness.events.subscribe();

        let backend = Arc::new(RecordingBackend::failing(&["B"]));
        let report = harness.replayer(backend.clone()).replay().await;

        assert_eq!(backend.received(), ["A", "B"]);
        let remaining: Vec<_> = harness.queue.list().into_iter().map(|op| op.id).collect();
        assert_eq!(remaining, [b.clone(), c]);
        assert_eq!(report.synced, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(report.halted.as_ref().map(|h| h.id.as_str()), Some(b.as_str()));
        assert_eq!(rx.try_recv().unwrap(), OfflineEvent::SyncComplete { synced: 1 });
    }

    #[tokio::test]
    async fn test_first_failure_leaves_queue_untouched() {
        let harness = Harness::new(true);
        harness.intake("A");
        harness.intake("B");
        let before = harness.queue.list();
        let mut rx = harness.events.subscribe();

        let backend = Arc::new(RecordingBackend::failing(&["A"]));
        let report = harness.replayer(backend.clone()).replay().await;

        assert_eq!(backend.received(), ["A"]);
        assert_eq!(harness.queue.list(), before);
        assert_eq!(report.synced, 0);
        assert!(rx.try_recv().is_err());
        assert!(harness.queue.last_sync().is_none());
    }

    #[tokio::test]
    async fn test_operations_queued_mid_pass_wait_for_next_pass() {
        let harness = Harness::new(true);
        harness.intake("A");
        harness.intake("B");

        let late = Operation::PackageIntake(PackageIntake {
            tracking_number: "LATE".to_string(),
            tenant_id: 42,
            carrier: None,
        });
        let backend = Arc::new(RecordingBackend {
            enqueue_on_first_write: Mutex::new(Some((harness.queue.clone(), late))),
            ..RecordingBackend::default()
        });
        let report = harness.replayer(backend.clone()).replay().await;

        assert_eq!(backend.received(), ["A", "B"]);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.synced, 2);
        assert_eq!(report.remaining, 1);
        let left = harness.queue.list();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].payload["tracking_number"], "LATE");

        let report = harness.replayer(backend.clone()).replay().await;
        assert_eq!(backend.received(), ["A", "B", "LATE"]);
        assert_eq!(report.remaining, 0);
    }

    #[tokio::test]
    async fn test_offline_is_a_noop() {
        let harness = Harness::new(false);
        harness.intake("A");

        let mut backend = MockBackend::new();
        backend.expect_create_package().times(0);

        let report = harness.replayer(Arc::new(backend)).replay().await;

        assert_eq!(report.skipped, Some(SkipReason::Offline));
        assert_eq!(report.remaining, 1);
        assert_eq!(harness.queue.count(), 1);
    }

    #[tokio::test]
    async fn test_empty_queue_is_a_noop() {
        let harness = Harness::new(true);
        let mut rx = harness.events.subscribe();

        let report = harness.replayer(Arc::new(MockBackend::new())).replay().await;

        assert_eq!(report.skipped, Some(SkipReason::EmptyQueue));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_abandoned_pass_resends() {
        let harness = Harness::new(true);
        harness.intake("A");

        let hanging = Arc::new(RecordingBackend {
            hang_on: vec!["A".to_string()],
            ..RecordingBackend::default()
        });
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), harness.replayer(hanging.clone()).replay())
                .await;
        assert!(abandoned.is_err());
        assert_eq!(hanging.received(), ["A"]);
        assert_eq!(harness.queue.count(), 1);

        let backend = Arc::new(RecordingBackend::default());
        let report = harness.replayer(backend.clone()).replay().await;

        assert_eq!(backend.received(), ["A"]);
        assert_eq!(report.synced, 1);
        assert_eq!(harness.queue.count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_pass_is_skipped() {
        let harness = Harness::new(true);
        harness.intake("A");

        let hanging = Arc::new(RecordingBackend {
            hang_on: vec!["A".to_string()],
            ..RecordingBackend::default()
        });
        let replayer = harness.replayer(hanging);

        let (first, second) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(20), replayer.replay()),
            async {
                tokio::task::yield_now().await;
                replayer.replay().await
            }
        );

        assert!(first.is_err());
        assert_eq!(second.skipped, Some(SkipReason::AlreadyRunning));
    }

    #[tokio::test]
    async fn test_unknown_operation_halts_loudly() {
        let harness = Harness::new(true);
        harness.db
            .set_item(
                PENDING_KEY,
                r#"[{"id":"op_1_future0000","type":"package_return","payload":{},"enqueuedAt":1}]"#,
            )
            .unwrap();
        harness.intake("A");

        let backend = Arc::new(RecordingBackend::default());
        let report = harness.replayer(backend.clone()).replay().await;

        assert!(backend.received().is_empty());
        assert_eq!(report.remaining, 2);
        let halt = report.halted.unwrap();
        assert_eq!(halt.operation_type, "package_return");
        assert!(halt.error.contains("Unrecognized operation type"));
    }

    #[tokio::test]
    async fn test_malformed_entry_halts_and_stays() {
        let harness = Harness::new(true);
        harness.intake("A");
        let mut entries: Vec<serde_json::Value> =
            serde_json::from_str(&harness.db.get_item(PENDING_KEY).unwrap().unwrap()).unwrap();
        entries.push(serde_json::json!({
            "id": "op_2_bbbbbbbbb",
            "type": "package_intake",
            "payload": {"tracking_number": "X", "tenant_id": 1},
            "tenantId": "t-9",
            "enqueuedAt": 2
        }));
        harness
            .db
            .set_item(PENDING_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();
        harness.intake("C");

        let backend = Arc::new(RecordingBackend::default());
        let report = harness.replayer(backend.clone()).replay().await;

        assert_eq!(backend.received(), ["A"]);
        assert_eq!(report.synced, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(report.halted.map(|h| h.id), Some("op_2_bbbbbbbbb".to_string()));
        assert_eq!(harness.queue.list()[0].id, "op_2_bbbbbbbbb");
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_type() {
        let harness = Harness::new(true);
        harness
            .queue
            .enqueue(&Operation::SignatureCapture(SignatureCapture {
                package_id: 9,
                signature_data: "sig".to_string(),
                captured_at: Some("2024-05-01T12:00:00Z".to_string()),
            }))
            .unwrap();

        let mut backend = MockBackend::new();
        backend.expect_create_package().times(0);
        backend.expect_process_pickup().times(0);
        backend
            .expect_capture_signature()
            .withf(|s| s.package_id == 9)
            .times(1)
            .returning(|_| Ok(()));

        let report = harness.replayer(Arc::new(backend)).replay().await;
        assert_eq!(report.synced, 1);
    }

    #[test]
    fn test_format_report() {
        let report = SyncReport {
            attempted: 3,
            synced: 1,
            remaining: 2,
            halted: Some(SyncHalt {
                id: "op_1_abc".to_string(),
                operation_type: "package_intake".to_string(),
                error: "Network error: timeout".to_string(),
            }),
            skipped: None,
        };

        let text = format_sync_report(&report);
        assert!(text.contains("1 synced"));
        assert!(text.contains("2 still pending"));
        assert!(text.contains("op_1_abc"));

        let skipped = format_sync_report(&SyncReport::skipped(SkipReason::EmptyQueue, 0));
        assert_eq!(skipped, "No pending operations to sync.");
    }
}
