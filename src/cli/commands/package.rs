//! Package write commands.
//!
//! Intake, pickup and signature capture all go through the offline manager,
//! which sends them straight away or queues them for the next sync.

use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::json;

use crate::api::{PackageIntake, PackagePickup, SignatureCapture};
use crate::cli::args::{IntakeArgs, OutputFormat, PickupArgs, SignatureArgs};
use crate::error::MailroomError;
use crate::features::offline::{OfflineManager, Operation, OperationContext, SubmitOutcome};
use crate::output::to_json;

/// Record a received package.
///
/// # Errors
///
/// Returns an error if the backend rejects the package or the queue cannot
/// be written.
pub async fn intake(
    manager: &OfflineManager,
    args: IntakeArgs,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    let operation = Operation::PackageIntake(PackageIntake {
        tracking_number: args.tracking_number,
        tenant_id: args.tenant,
        carrier: args.carrier,
    });
    let context = OperationContext {
        mailbox_id: args.mailbox,
        tenant_id: Some(args.tenant),
    };

    submit(manager, &operation, context, format).await
}

/// Hand packages over to a tenant.
///
/// # Errors
///
/// Returns an error if the signature file cannot be read, the backend
/// rejects the pickup, or the queue cannot be written.
pub async fn pickup(
    manager: &OfflineManager,
    args: PickupArgs,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    let operation = Operation::PackagePickup(PackagePickup {
        package_ids: args.packages,
        tenant_id: args.tenant,
        pickup_person_name: args.name,
        signature_data: read_signature(&args.signature)?,
    });
    let context = OperationContext {
        mailbox_id: args.mailbox,
        tenant_id: Some(args.tenant),
    };

    submit(manager, &operation, context, format).await
}

/// Attach a signature to a package.
///
/// # Errors
///
/// Returns an error if the capture time is not RFC 3339, the signature file
/// cannot be read, the backend rejects the signature, or the queue cannot be
/// written.
pub async fn signature(
    manager: &OfflineManager,
    args: SignatureArgs,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    let captured_at = match args.captured_at {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| MailroomError::Config(format!("Invalid --captured-at '{raw}': {e}")))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let operation = Operation::SignatureCapture(SignatureCapture {
        package_id: args.package,
        signature_data: read_signature(&args.signature)?,
        captured_at: Some(captured_at.to_rfc3339()),
    });

    submit(manager, &operation, OperationContext::default(), format).await
}

async fn submit(
    manager: &OfflineManager,
    operation: &Operation,
    context: OperationContext,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    let outcome = manager.submit(operation, context).await?;
    format_outcome(operation, &outcome, format)
}

fn format_outcome(
    operation: &Operation,
    outcome: &SubmitOutcome,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    let name = operation.operation_type().display_name();

    match format {
        OutputFormat::Json => {
            let data = json!({
                "operation": operation.operation_type().as_str(),
                "result": outcome,
            });
            to_json(&data)
        },
        OutputFormat::Pretty => Ok(match outcome {
            SubmitOutcome::Sent => format!("{} {} recorded", "✓".green(), name),
            SubmitOutcome::Queued { id, pending } => format!(
                "{} {} queued for sync ({})\n  {}",
                "○".yellow(),
                name,
                id.dimmed(),
                format!("{pending} operations pending").dimmed()
            ),
        }),
    }
}

/// Signature data given inline, or `@path` to read it from a file.
fn read_signature(value: &str) -> Result<String, MailroomError> {
    match value.strip_prefix('@') {
        Some(path) => {
            let data = std::fs::read_to_string(Path::new(path))?;
            Ok(data.trim_end().to_string())
        },
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use crate::api::MockBackend;
    use crate::storage::Database;

    fn offline_manager() -> OfflineManager {
        OfflineManager::new(
            Database::open_in_memory().unwrap(),
            Arc::new(MockBackend::new()),
            false,
        )
    }

    #[test]
    fn test_read_signature_inline() {
        assert_eq!(read_signature("data:image/png;base64,AAA").unwrap(), "data:image/png;base64,AAA");
    }

    #[test]
    fn test_read_signature_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data:image/png;base64,BBB").unwrap();

        let arg = format!("@{}", file.path().display());
        assert_eq!(read_signature(&arg).unwrap(), "data:image/png;base64,BBB");
    }

    #[test]
    fn test_read_signature_missing_file() {
        let err = read_signature("@/nonexistent/signature.txt").unwrap_err();
        assert!(matches!(err, MailroomError::Io(_)));
    }

    #[tokio::test]
    async fn test_offline_intake_is_queued() {
        let manager = offline_manager();
        let args = IntakeArgs {
            tracking_number: "1Z999AA10123456784".to_string(),
            tenant: 42,
            carrier: Some("UPS".to_string()),
            mailbox: Some(7),
        };

        let output = intake(&manager, args, OutputFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["operation"], "package_intake");
        assert_eq!(value["result"]["status"], "queued");
        assert_eq!(value["result"]["pending"], 1);

        let queued = manager.queue().list();
        assert_eq!(queued[0].mailbox_id, Some(7));
        assert_eq!(queued[0].tenant_id, Some(42));
    }

    #[tokio::test]
    async fn test_signature_rejects_bad_timestamp() {
        let manager = offline_manager();
        let args = SignatureArgs {
            package: 1,
            signature: "sig".to_string(),
            captured_at: Some("yesterday".to_string()),
        };

        let err = signature(&manager, args, OutputFormat::Pretty).await.unwrap_err();
        assert!(matches!(err, MailroomError::Config(_)));
        assert_eq!(manager.queue().count(), 0);
    }

    #[tokio::test]
    async fn test_signature_normalizes_timestamp() {
        let manager = offline_manager();
        let args = SignatureArgs {
            package: 1,
            signature: "sig".to_string(),
            captured_at: Some("2024-03-01T09:30:00+01:00".to_string()),
        };

        let output = signature(&manager, args, OutputFormat::Pretty).await.unwrap();
        assert!(output.contains("Signature Capture queued for sync"));

        let queued = manager.queue().list();
        assert_eq!(queued[0].payload["captured_at"], "2024-03-01T08:30:00+00:00");
    }
}
