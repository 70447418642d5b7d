//! Request and record types exchanged with the backend.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of a package intake write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIntake {
    pub tracking_number: String,
    pub tenant_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
}

/// Body of a pickup write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePickup {
    pub package_ids: Vec<i64>,
    pub tenant_id: i64,
    pub pickup_person_name: String,
    /// Encoded signature image, usually a `data:image/png;base64,...` URL.
    pub signature_data: String,
}

/// Body of a signature capture write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureCapture {
    pub package_id: i64,
    pub signature_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
}

/// A person or business that receives packages at a mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A physical pickup slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub id: i64,
    /// Number printed on the slot. Backends send it as a string or an integer.
    #[serde(deserialize_with = "string_or_number")]
    pub mailbox_number: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub default_tenant_id: Option<i64>,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
}

const fn default_true() -> bool {
    true
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
