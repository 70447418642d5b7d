//! Output formatting for mailroom.
//!
//! This module provides formatters for displaying mailboxes and queued
//! operations in various formats.

mod json;
mod pretty;

use crate::api::Mailbox;
use crate::cli::args::OutputFormat;
use crate::error::MailroomError;
use crate::features::offline::QueuedOperation;

pub use json::*;
pub use pretty::*;

/// Format mailbox search results based on output format
///
/// # Errors
///
/// Returns `MailroomError::Parse` if JSON serialization fails.
pub fn format_mailboxes(
    mailboxes: &[Mailbox],
    query: &str,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    match format {
        OutputFormat::Pretty => Ok(format_mailboxes_pretty(mailboxes, query)),
        OutputFormat::Json => format_mailboxes_json(mailboxes, query),
    }
}

/// Format queued operations based on output format
///
/// # Errors
///
/// Returns `MailroomError::Parse` if JSON serialization fails.
pub fn format_operations(
    operations: &[QueuedOperation],
    limit: usize,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    match format {
        OutputFormat::Pretty => Ok(format_operations_pretty(operations, limit)),
        OutputFormat::Json => format_operations_json(operations, limit),
    }
}
