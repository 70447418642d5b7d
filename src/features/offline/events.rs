//! Advisory notifications for UI collaborators.
//!
//! Events are best-effort: publishing with nobody listening is fine, and a
//! lagging subscriber simply misses some.

use tokio::sync::broadcast;
use tracing::trace;

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Something the offline subsystem wants the UI to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineEvent {
    /// An operation was queued; carries the new queue length.
    OperationQueued { pending: usize },
    /// A replay pass sent at least one operation.
    SyncComplete { synced: usize },
    /// Host reported connectivity.
    BecameOnline,
    /// Host reported loss of connectivity.
    BecameOffline,
}

/// Fan-out channel for `OfflineEvent`s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OfflineEvent>,
}

impl EventBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a bus buffering `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OfflineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    pub fn publish(&self, event: OfflineEvent) -> usize {
        self.sender.send(event).unwrap_or_else(|_| {
            trace!(?event, "No subscribers for event");
            0
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
