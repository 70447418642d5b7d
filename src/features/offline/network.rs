//! Connectivity tracking.
//!
//! The observer trusts whatever the host reports and never tests the
//! network itself. Only transitions are announced.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::events::{EventBus, OfflineEvent};

/// Cached online/offline flag fed by host connectivity signals.
#[derive(Clone)]
pub struct NetworkObserver {
    state: Arc<watch::Sender<bool>>,
    events: EventBus,
}

impl NetworkObserver {
    /// Create an observer with the host's current state. No event is
    /// published for the initial value.
    #[must_use]
    pub fn new(online: bool, events: EventBus) -> Self {
        let (state, _) = watch::channel(online);
        Self {
            state: Arc::new(state),
            events,
        }
    }

    /// Last reported connectivity.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Feed a host connectivity signal.
    ///
    /// Returns `true` if this changed the state.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            info!(online, "Connectivity changed");
            self.events.publish(if online {
                OfflineEvent::BecameOnline
            } else {
                OfflineEvent::BecameOffline
            });
        }

        changed
    }

    /// Watch connectivity; the receiver wakes on transitions only.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let events = EventBus::new();
        let mut rx = events.subscribe();

        assert!(!NetworkObserver::new(false, events.clone()).is_online());
        assert!(NetworkObserver::new(true, events).is_online());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_transitions_only() {
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let observer = NetworkObserver::new(false, events);

        assert!(!observer.set_online(false));
        assert!(observer.set_online(true));
        assert!(!observer.set_online(true));
        assert!(observer.set_online(false));

        assert_eq!(rx.try_recv().unwrap(), OfflineEvent::BecameOnline);
        assert_eq!(rx.try_recv().unwrap(), OfflineEvent::BecameOffline);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_watchers_wake_on_change() {
        let observer = NetworkObserver::new(false, EventBus::new());
        let mut rx = observer.subscribe();

        observer.set_online(false);
        assert!(!rx.has_changed().unwrap());

        observer.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
