//! Offline operation queue.
//!
//! Writes made without connectivity are persisted in device storage and
//! replayed against the backend, oldest first, once the host reports it is
//! online again.
//!
//! Features:
//! - Durable queue of package intake, pickup and signature writes
//! - Connectivity observer that announces transitions only
//! - Ordered replay that stops at the first failure (at-least-once delivery)
//! - Advisory "queued" and "synced" events for status indicators

pub mod events;
pub mod manager;
pub mod network;
pub mod operation;
pub mod queue;
pub mod replayer;

pub use events::{EventBus, OfflineEvent};
pub use manager::{OfflineManager, SubmitOutcome};
pub use network::NetworkObserver;
pub use operation::{Operation, OperationContext, OperationType, QueuedOperation};
pub use queue::{OperationQueue, QueueStats};
pub use replayer::{format_sync_report, SkipReason, SyncHalt, SyncReplayer, SyncReport};
