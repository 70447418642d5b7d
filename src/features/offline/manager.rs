//! Session-level wiring of the offline subsystem.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::events::EventBus;
use super::network::NetworkObserver;
use super::operation::{Operation, OperationContext};
use super::queue::OperationQueue;
use super::replayer::{SyncReplayer, SyncReport};
use crate::api::Backend;
use crate::error::MailroomError;
use crate::storage::Database;

/// What happened to a submitted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The backend accepted it.
    Sent,
    /// It is waiting in the queue.
    Queued { id: String, pending: usize },
}

/// Owns the queue, connectivity flag and replayer for one session.
#[derive(Clone)]
pub struct OfflineManager {
    queue: OperationQueue,
    network: NetworkObserver,
    replayer: SyncReplayer,
    events: EventBus,
}

impl OfflineManager {
    /// Wire up the offline subsystem over `db`.
    #[must_use]
    pub fn new(db: Database, backend: Arc<dyn Backend>, online: bool) -> Self {
        let events = EventBus::new();
        let queue = OperationQueue::new(db, events.clone());
        let network = NetworkObserver::new(online, events.clone());
        let replayer = SyncReplayer::new(
            queue.clone(),
            backend,
            network.clone(),
            events.clone(),
        );

        Self {
            queue,
            network,
            replayer,
            events,
        }
    }

    /// The pending operation store.
    #[must_use]
    pub const fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    /// The connectivity flag.
    #[must_use]
    pub const fn network(&self) -> &NetworkObserver {
        &self.network
    }

    /// The advisory event channel.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Perform a write, queueing it when it cannot be sent now.
    ///
    /// Offline writes are queued. Online writes go straight to the backend
    /// unless older writes are still queued, in which case the new one
    /// joins the back of the queue and a replay pass runs. A direct send
    /// that never reaches the backend is queued as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects a direct send or the queue
    /// cannot be written.
    pub async fn submit(
        &self,
        operation: &Operation,
        context: OperationContext,
    ) -> Result<SubmitOutcome, MailroomError> {
        if !self.network.is_online() {
            return self.enqueue(operation, context);
        }

        if self.queue.count() > 0 {
            let outcome = self.enqueue(operation, context)?;
            self.replayer.replay().await;
            return Ok(self.refresh(outcome));
        }

        match self.replayer.send(operation).await {
            Ok(()) => Ok(SubmitOutcome::Sent),
            Err(e) if e.is_network() => {
                warn!(error = %e, "Backend unreachable, queueing {}", operation.operation_type());
                self.enqueue(operation, context)
            },
            Err(e) => Err(e),
        }
    }

    /// Feed a host connectivity signal.
    ///
    /// Coming back online runs a replay pass and returns its report.
    pub async fn set_online(&self, online: bool) -> Option<SyncReport> {
        if self.network.set_online(online) && online {
            Some(self.replayer.replay().await)
        } else {
            None
        }
    }

    /// Manual retry trigger.
    pub async fn sync_now(&self) -> SyncReport {
        self.replayer.replay().await
    }

    fn enqueue(
        &self,
        operation: &Operation,
        context: OperationContext,
    ) -> Result<SubmitOutcome, MailroomError> {
        let id = self.queue.enqueue_with(operation, context)?;
        let pending = self.queue.count();
        info!(op_id = %id, pending, "Queued for sync");
        Ok(SubmitOutcome::Queued { id, pending })
    }

    fn refresh(&self, outcome: SubmitOutcome) -> SubmitOutcome {
        match outcome {
            SubmitOutcome::Queued { id, .. } => {
                let operations = self.queue.list();
                if operations.iter().any(|op| op.id == id) {
                    SubmitOutcome::Queued {
                        id,
                        pending: operations.len(),
                    }
                } else {
                    SubmitOutcome::Sent
                }
            },
            SubmitOutcome::Sent => SubmitOutcome::Sent,
        }
    }
}
