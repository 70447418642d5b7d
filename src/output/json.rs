//! JSON output formatting for mailroom.

use serde::Serialize;
use serde_json::json;

use crate::api::Mailbox;
use crate::error::MailroomError;
use crate::features::offline::QueuedOperation;

/// Format mailbox search results as JSON
///
/// # Errors
///
/// Returns `MailroomError::Parse` if JSON serialization fails.
pub fn format_mailboxes_json(mailboxes: &[Mailbox], query: &str) -> Result<String, MailroomError> {
    let output = json!({
        "query": query,
        "count": mailboxes.len(),
        "items": mailboxes
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format queued operations as JSON, oldest first
///
/// `count` is the full queue length; `items` holds at most `limit` entries.
///
/// # Errors
///
/// Returns `MailroomError::Parse` if JSON serialization fails.
pub fn format_operations_json(
    operations: &[QueuedOperation],
    limit: usize,
) -> Result<String, MailroomError> {
    let shown = &operations[..operations.len().min(limit)];
    let output = json!({
        "count": operations.len(),
        "items": shown
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `MailroomError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, MailroomError> {
    Ok(serde_json::to_string_pretty(value)?)
}
