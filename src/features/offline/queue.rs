//! Operation queue storage.
//!
//! The queue is one JSON array in device storage, in enqueue order. Reads
//! never fail: unreadable or unparseable storage is logged and treated as an
//! empty queue. Writes only rewrite what they could read. Entries are kept
//! as stored, so a record this build cannot decode stays in place, and a
//! document that is not an array at all is moved aside before the queue
//! starts over.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::events::{EventBus, OfflineEvent};
use super::operation::{Operation, OperationContext, QueuedOperation};
use crate::error::MailroomError;
use crate::storage::Database;

/// Storage key of the pending operations list.
pub const PENDING_KEY: &str = "pending_operations";
/// Storage key of the last successful sync timestamp.
pub const LAST_SYNC_KEY: &str = "last_sync";
/// Prefix of keys holding queue documents that could not be parsed.
pub const CORRUPT_KEY_PREFIX: &str = "pending_operations.corrupt.";

/// Durable, ordered list of pending writes.
#[derive(Clone)]
pub struct OperationQueue {
    db: Database,
    events: EventBus,
}

impl OperationQueue {
    /// Create a queue over `db`, announcing changes on `events`.
    #[must_use]
    pub const fn new(db: Database, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Append an operation and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be written.
    pub fn enqueue(&self, operation: &Operation) -> Result<String, MailroomError> {
        self.enqueue_with(operation, OperationContext::default())
    }

    /// Append an operation with explicit mailbox/tenant context.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn enqueue_with(
        &self,
        operation: &Operation,
        context: OperationContext,
    ) -> Result<String, MailroomError> {
        let record = QueuedOperation::new(operation, context)?;
        let id = record.id.clone();

        let mut entries = self.load_for_update()?;
        entries.push(serde_json::to_value(&record)?);
        self.save(&entries)?;

        let pending = entries.len();
        debug!(op_id = %id, pending, "Queued operation");
        self.events.publish(OfflineEvent::OperationQueued { pending });

        Ok(id)
    }

    /// Snapshot of every pending operation in enqueue order.
    #[must_use]
    pub fn list(&self) -> Vec<QueuedOperation> {
        self.load()
    }

    /// Number of pending operations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.load().len()
    }

    /// Remove the operations whose id is in `ids`.
    ///
    /// Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn remove(&self, ids: &[String]) -> Result<usize, MailroomError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut entries = self.load_for_update()?;
        let before = entries.len();
        entries.retain(|entry| {
            entry
                .get("id")
                .and_then(Value::as_str)
                .map_or(true, |id| !ids.contains(id))
        });

        let removed = before - entries.len();
        if removed > 0 {
            self.save(&entries)?;
        }

        Ok(removed)
    }

    /// Drop every pending operation.
    ///
    /// Returns how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<usize, MailroomError> {
        let count = self.count();
        self.db.remove_item(PENDING_KEY)?;
        warn!(dropped = count, "Cleared offline queue");
        Ok(count)
    }

    /// When the last replay pass sent something.
    #[must_use]
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = match self.db.get_item(LAST_SYNC_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Could not read last sync time");
                return None;
            },
        };

        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| warn!(error = %e, value = %raw, "Ignoring malformed last sync time"))
            .ok()
    }

    /// Record a successful replay.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn record_sync(&self, at: DateTime<Utc>) -> Result<(), MailroomError> {
        self.db.set_item(LAST_SYNC_KEY, &at.to_rfc3339())
    }

    /// Get queue statistics.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let operations = self.load();
        QueueStats {
            pending: operations.len(),
            oldest_pending: operations
                .iter()
                .map(|op| op.enqueued_at)
                .min()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            last_sync: self.last_sync(),
        }
    }

    fn load(&self) -> Vec<QueuedOperation> {
        let raw = match self.db.get_item(PENDING_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Offline queue unavailable, treating as empty");
                return Vec::new();
            },
        };

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(entries) => entries
                .into_iter()
                .map(QueuedOperation::from_stored)
                .inspect(|op| {
                    if let Some(reason) = &op.unreadable {
                        warn!(op_id = %op.id, error = %reason, "Unreadable queue entry");
                    }
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Offline queue is corrupt, treating as empty");
                Vec::new()
            },
        }
    }

    /// Stored entries for a read-modify-write.
    ///
    /// Fails rather than returning an empty list when storage cannot be
    /// read, so the caller never overwrites entries it did not see.
    fn load_for_update(&self) -> Result<Vec<Value>, MailroomError> {
        let Some(raw) = self.db.get_item(PENDING_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                let key = format!("{CORRUPT_KEY_PREFIX}{}", Utc::now().timestamp_millis());
                self.db.set_item(&key, &raw)?;
                error!(error = %e, moved_to = %key, "Offline queue is corrupt, starting a new one");
                Ok(Vec::new())
            },
        }
    }

    fn save(&self, entries: &[Value]) -> Result<(), MailroomError> {
        let json = serde_json::to_string(entries)?;
        self.db.set_item(PENDING_KEY, &json)
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    /// Number of pending operations
    pub pending: usize,
    /// Oldest pending operation timestamp
    pub oldest_pending: Option<DateTime<Utc>>,
    /// Last successful sync
    pub last_sync: Option<DateTime<Utc>>,
}
