//! Offline queue command implementation.
//!
//! Handles queue inspection and the manual sync trigger.

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::cli::args::{OutputFormat, QueueCommands};
use crate::error::MailroomError;
use crate::features::offline::{format_sync_report, OfflineManager, OperationQueue};
use crate::output::{format_operations, to_json};

/// Replay queued operations now.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub async fn sync(manager: &OfflineManager, format: OutputFormat) -> Result<String, MailroomError> {
    let report = manager.sync_now().await;

    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Pretty => Ok(format_sync_report(&report)),
    }
}

/// Execute queue subcommands.
///
/// # Errors
///
/// Returns an error if the queue cannot be written or clearing was not
/// confirmed.
pub fn queue(
    queue: &OperationQueue,
    cmd: QueueCommands,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    match cmd {
        QueueCommands::Status => show_status(queue, format),
        QueueCommands::List { limit } => format_operations(&queue.list(), limit, format),
        QueueCommands::Clear { force } => clear_operations(queue, force, format),
    }
}

/// Show queue status.
fn show_status(queue: &OperationQueue, format: OutputFormat) -> Result<String, MailroomError> {
    let stats = queue.stats();

    match format {
        OutputFormat::Json => to_json(&stats),
        OutputFormat::Pretty => {
            let mut lines = Vec::new();

            lines.push("Offline Queue Status".bold().to_string());
            lines.push("─".repeat(40));

            lines.push(format!(
                "  Pending:    {} {}",
                stats.pending,
                if stats.pending > 0 {
                    "operations waiting".dimmed()
                } else {
                    "".dimmed()
                }
            ));

            if let Some(oldest) = stats.oldest_pending {
                lines.push(format!("  Oldest:     {}", format_age(oldest).dimmed()));
            }

            lines.push(format!(
                "  Last sync:  {}",
                stats
                    .last_sync
                    .map_or_else(|| "never".to_string(), format_age)
                    .dimmed()
            ));

            if stats.pending > 0 {
                lines.push(String::new());
                lines.push(
                    "Run 'mailroom sync' to send pending operations"
                        .dimmed()
                        .to_string(),
                );
            }

            Ok(lines.join("\n"))
        },
    }
}

/// Clear every operation from the queue.
fn clear_operations(
    queue: &OperationQueue,
    force: bool,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    if !force {
        return Err(MailroomError::Config(
            "Use --force to clear all queued operations".to_string(),
        ));
    }

    let count = queue.clear()?;

    match format {
        OutputFormat::Json => {
            let data = serde_json::json!({"cleared": count});
            to_json(&data)
        },
        OutputFormat::Pretty => Ok(format!("Cleared {count} operations from queue")),
    }
}

fn format_age(at: DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(at);
    if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::api::{MockBackend, PackageIntake};
    use crate::features::offline::{EventBus, Operation};
    use crate::storage::Database;

    fn test_queue() -> OperationQueue {
        OperationQueue::new(Database::open_in_memory().unwrap(), EventBus::new())
    }

    fn intake(tracking: &str) -> Operation {
        Operation::PackageIntake(PackageIntake {
            tracking_number: tracking.to_string(),
            tenant_id: 42,
            carrier: None,
        })
    }

    #[test]
    fn test_status_json() {
        let queue = test_queue();
        queue.enqueue(&intake("A")).unwrap();

        let output = queue_status(&queue, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["pending"], 1);
        assert!(value["last_sync"].is_null());
    }

    #[test]
    fn test_status_pretty_hints_sync() {
        let queue = test_queue();
        queue.enqueue(&intake("A")).unwrap();

        let output = queue_status(&queue, OutputFormat::Pretty);
        assert!(output.contains("Pending:    1"));
        assert!(output.contains("Last sync:  never"));
        assert!(output.contains("mailroom sync"));
    }

    #[test]
    fn test_clear_requires_force() {
        let queue = test_queue();
        queue.enqueue(&intake("A")).unwrap();

        let err = super::queue(&queue, QueueCommands::Clear { force: false }, OutputFormat::Pretty)
            .unwrap_err();
        assert!(matches!(err, MailroomError::Config(_)));
        assert_eq!(queue.count(), 1);

        let output =
            super::queue(&queue, QueueCommands::Clear { force: true }, OutputFormat::Pretty).unwrap();
        assert_eq!(output, "Cleared 1 operations from queue");
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Utc::now()), "just now");
        assert_eq!(format_age(Utc::now() - Duration::minutes(5)), "5 minutes ago");
        assert_eq!(format_age(Utc::now() - Duration::hours(3)), "3 hours ago");
    }

    #[tokio::test]
    async fn test_sync_offline_reports_waiting() {
        let manager = OfflineManager::new(
            Database::open_in_memory().unwrap(),
            Arc::new(MockBackend::new()),
            false,
        );
        manager.queue().enqueue(&intake("A")).unwrap();

        let output = sync(&manager, OutputFormat::Pretty).await.unwrap();
        assert!(output.contains("Offline: 1 operations waiting"));
    }

    fn queue_status(queue: &OperationQueue, format: OutputFormat) -> String {
        super::queue(queue, QueueCommands::Status, format).unwrap()
    }
}
