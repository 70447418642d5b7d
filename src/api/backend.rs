//! The backend seam.

use async_trait::async_trait;

use super::types::{Mailbox, PackageIntake, PackagePickup, SignatureCapture};
use crate::error::MailroomError;

/// The system of record.
///
/// Write calls either succeed or fail; callers that replay queued writes do
/// not look inside the error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Record a newly received package.
    async fn create_package(&self, intake: &PackageIntake) -> Result<(), MailroomError>;

    /// Hand packages over to a tenant.
    async fn process_pickup(&self, pickup: &PackagePickup) -> Result<(), MailroomError>;

    /// Attach a signature to a package.
    async fn capture_signature(&self, signature: &SignatureCapture) -> Result<(), MailroomError>;

    /// Fetch every mailbox with its tenants.
    async fn fetch_mailboxes(&self) -> Result<Vec<Mailbox>, MailroomError>;
}
