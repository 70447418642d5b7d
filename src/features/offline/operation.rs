//! Operation types for the offline queue.
//!
//! Defines the writes that can be queued and the record persisted for each.

use std::str::FromStr;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{PackageIntake, PackagePickup, SignatureCapture};
use crate::error::MailroomError;

/// Operation types that can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Record a received package
    PackageIntake,
    /// Hand packages to a tenant
    PackagePickup,
    /// Attach a signature to a package
    SignatureCapture,
}

impl OperationType {
    /// Tag stored in the `type` field of a queued record.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PackageIntake => "package_intake",
            Self::PackagePickup => "package_pickup",
            Self::SignatureCapture => "signature_capture",
        }
    }

    /// Get the display name for this operation type.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::PackageIntake => "Package Intake",
            Self::PackagePickup => "Package Pickup",
            Self::SignatureCapture => "Signature Capture",
        }
    }
}

impl FromStr for OperationType {
    type Err = MailroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "package_intake" => Ok(Self::PackageIntake),
            "package_pickup" => Ok(Self::PackagePickup),
            "signature_capture" => Ok(Self::SignatureCapture),
            other => Err(MailroomError::UnknownOperation(other.to_string())),
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A write destined for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    PackageIntake(PackageIntake),
    PackagePickup(PackagePickup),
    SignatureCapture(SignatureCapture),
}

impl Operation {
    /// The type tag of this operation.
    #[must_use]
    pub const fn operation_type(&self) -> OperationType {
        match self {
            Self::PackageIntake(_) => OperationType::PackageIntake,
            Self::PackagePickup(_) => OperationType::PackagePickup,
            Self::SignatureCapture(_) => OperationType::SignatureCapture,
        }
    }

    /// Tenant the payload refers to, if it names one.
    #[must_use]
    pub const fn tenant_id(&self) -> Option<i64> {
        match self {
            Self::PackageIntake(p) => Some(p.tenant_id),
            Self::PackagePickup(p) => Some(p.tenant_id),
            Self::SignatureCapture(_) => None,
        }
    }

    fn to_payload(&self) -> Result<Value, MailroomError> {
        let value = match self {
            Self::PackageIntake(p) => serde_json::to_value(p)?,
            Self::PackagePickup(p) => serde_json::to_value(p)?,
            Self::SignatureCapture(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}

/// Identifiers carried alongside a queued operation for display and grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationContext {
    pub mailbox_id: Option<i64>,
    pub tenant_id: Option<i64>,
}

/// A queued operation as persisted in device storage.
///
/// The type tag is kept as written so that a record from a newer build
/// survives a rewrite of the queue by this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    /// Unique ID
    pub id: String,
    /// Operation type tag
    #[serde(rename = "type")]
    pub op_type: String,
    /// Request body for the backend
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailbox_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    /// When the operation was queued, epoch milliseconds
    pub enqueued_at: i64,
    /// Fields written by other builds, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Why the stored entry could not be read, if it could not
    #[serde(skip)]
    pub unreadable: Option<String>,
}

impl QueuedOperation {
    /// Wrap an operation in a new record with a fresh id and timestamp.
    ///
    /// The tenant id falls back to the one in the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded.
    pub fn new(operation: &Operation, context: OperationContext) -> Result<Self, MailroomError> {
        let enqueued_at = Utc::now().timestamp_millis();
        Ok(Self {
            id: generate_id(enqueued_at),
            op_type: operation.operation_type().as_str().to_string(),
            payload: operation.to_payload()?,
            mailbox_id: context.mailbox_id,
            tenant_id: context.tenant_id.or_else(|| operation.tenant_id()),
            enqueued_at,
            extra: Map::new(),
            unreadable: None,
        })
    }

    /// Read one stored queue entry.
    ///
    /// An entry that does not have the expected shape is still returned, with
    /// whatever id, tag and timestamp could be recovered, so that it keeps its
    /// place in the queue and halts replay instead of vanishing.
    #[must_use]
    pub fn from_stored(value: Value) -> Self {
        match Self::deserialize(&value) {
            Ok(record) => record,
            Err(e) => {
                let field = |name: &str| value.get(name).and_then(Value::as_str).unwrap_or_default();
                Self {
                    id: field("id").to_string(),
                    op_type: field("type").to_string(),
                    payload: value.get("payload").cloned().unwrap_or(Value::Null),
                    mailbox_id: None,
                    tenant_id: None,
                    enqueued_at: value.get("enqueuedAt").and_then(Value::as_i64).unwrap_or(0),
                    extra: Map::new(),
                    unreadable: Some(e.to_string()),
                }
            },
        }
    }

    /// The known type of this record.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation` if the tag is not one this build handles.
    pub fn operation_type(&self) -> Result<OperationType, MailroomError> {
        self.op_type.parse()
    }

    /// Decode the typed operation for dispatch.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation` for a foreign tag and `InvalidPayload` if
    /// the payload does not match the tag.
    pub fn decode(&self) -> Result<Operation, MailroomError> {
        if let Some(reason) = &self.unreadable {
            return Err(MailroomError::InvalidPayload {
                operation: self.op_type.clone(),
                message: format!("unreadable queue entry: {reason}"),
            });
        }
        let payload = self.payload.clone();
        let decoded = match self.operation_type()? {
            OperationType::PackageIntake => {
                serde_json::from_value(payload).map(Operation::PackageIntake)
            },
            OperationType::PackagePickup => {
                serde_json::from_value(payload).map(Operation::PackagePickup)
            },
            OperationType::SignatureCapture => {
                serde_json::from_value(payload).map(Operation::SignatureCapture)
            },
        };

        decoded.map_err(|e| MailroomError::InvalidPayload {
            operation: self.op_type.clone(),
            message: e.to_string(),
        })
    }

    /// Human-readable type name, falling back to the raw tag.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.operation_type()
            .map_or_else(|_| self.op_type.clone(), |t| t.display_name().to_string())
    }
}

/// `op_<millis>_<9 random lowercase alphanumerics>`.
fn generate_id(millis: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("op_{millis}_{suffix}")
}
