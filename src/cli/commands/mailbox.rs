//! Mailbox directory commands.

use colored::Colorize;
use serde_json::json;

use crate::cli::args::{MailboxCommands, OutputFormat};
use crate::error::MailroomError;
use crate::features::mailbox::MailboxCache;
use crate::output::{format_mailboxes, to_json};

/// Execute mailbox subcommands.
///
/// # Errors
///
/// Returns an error if an explicit reload fails or JSON serialization fails.
pub async fn mailbox(
    cache: &mut MailboxCache,
    cmd: MailboxCommands,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    match cmd {
        MailboxCommands::Search { query, limit } => {
            let results = match limit {
                Some(limit) => cache.search_with_limit(&query, limit).await,
                None => cache.search(&query).await,
            };
            format_mailboxes(&results, &query, format)
        },
        MailboxCommands::Reload => {
            let count = cache.reload().await?;
            match format {
                OutputFormat::Json => to_json(&json!({"loaded": count})),
                OutputFormat::Pretty => Ok(format!("{} Loaded {} mailboxes", "✓".green(), count)),
            }
        },
        MailboxCommands::Invalidate => {
            cache.invalidate();
            match format {
                OutputFormat::Json => to_json(&json!({"invalidated": true})),
                OutputFormat::Pretty => {
                    Ok("Mailbox cache cleared; the next search refetches".to_string())
                },
            }
        },
    }
}
