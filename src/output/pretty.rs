use chrono::{TimeZone, Utc};
use colored::Colorize;

use crate::api::Mailbox;
use crate::features::offline::QueuedOperation;

/// Format mailbox search results as a pretty list
pub fn format_mailboxes_pretty(mailboxes: &[Mailbox], query: &str) -> String {
    if mailboxes.is_empty() {
        return format!("No mailboxes match '{query}'");
    }

    let mut output = format!("Mailboxes matching '{}' ({})\n", query, mailboxes.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for mailbox in mailboxes {
        let mut line = format!("{:>6}", mailbox.mailbox_number.bold());

        if let Some(name) = &mailbox.display_name {
            line.push_str(&format!("  {name}"));
        }
        line.push_str(&format!("  {}", format!("id {}", mailbox.id).dimmed()));

        output.push_str(&line);
        output.push('\n');

        for tenant in &mailbox.tenants {
            let marker = if mailbox.default_tenant_id == Some(tenant.id) {
                "*".cyan()
            } else {
                " ".normal()
            };
            let name = if tenant.is_active {
                tenant.name.clone()
            } else {
                tenant.name.dimmed().strikethrough().to_string()
            };
            output.push_str(&format!(
                "        {} {}  {}\n",
                marker,
                name,
                format!("tenant {}", tenant.id).dimmed()
            ));
        }
    }

    output
}

/// Format queued operations as a table, oldest first
pub fn format_operations_pretty(operations: &[QueuedOperation], limit: usize) -> String {
    if operations.is_empty() {
        return "No pending operations in queue.".to_string();
    }

    let mut lines = Vec::new();

    lines.push(format!("Pending Operations ({})", operations.len()));
    lines.push("─".repeat(72));
    lines.push(format!(
        "{:<26} {:<18} {:<17} {}",
        "ID", "Type", "Queued", "Tenant"
    ));
    lines.push("─".repeat(72));

    for op in operations.iter().take(limit) {
        let queued = Utc
            .timestamp_millis_opt(op.enqueued_at)
            .single()
            .map_or_else(|| "?".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let tenant = op.tenant_id.map(|t| t.to_string()).unwrap_or_default();
        let kind = if op.operation_type().is_ok() {
            op.display_name().normal()
        } else {
            op.display_name().red()
        };

        lines.push(format!("{:<26} {:<18} {:<17} {}", op.id, kind, queued, tenant));
    }

    if operations.len() > limit {
        lines.push(
            format!("... and {} more", operations.len() - limit)
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}
