//! Member record models
//!
//! The base membership row, the joined view row (with resolved area and
//! district names), and the save payload. The natural key is always the
//! `(civil_id, dob)` pair; the numeric `id` is a server-assigned display
//! membership number.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::serde_helpers::medical_flag;

/// Approval status of a membership record.
///
/// The gateway stores both full words and legacy single-letter codes;
/// parsing is tolerant and unknown values fall back to `Pending`, which
/// keeps the record editable and the card download hidden. Writes always
/// use the legacy letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Tolerant parse: case-insensitive words and legacy letters.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "a" | "approved" => ApprovalStatus::Approved,
            "r" | "rejected" => ApprovalStatus::Rejected,
            _ => ApprovalStatus::Pending,
        }
    }

    /// Legacy single-letter code used for gateway writes.
    pub fn as_code(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "P",
            ApprovalStatus::Approved => "A",
            ApprovalStatus::Rejected => "R",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }
}

impl Serialize for ApprovalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_code())
    }
}

impl<'de> Deserialize<'de> for ApprovalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// Base membership table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Display membership number, assigned by the server.
    pub id: Option<i64>,
    pub civil_id: String,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: String,
    pub name: String,
    pub father_name: Option<String>,
    pub family_name: Option<String>,
    pub district_id: Option<i64>,
    pub area_id: Option<i64>,
    pub mobile_number: String,
    pub blood_group: Option<String>,
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "medical_flag")]
    pub medical: bool,
    pub local_address: Option<String>,
    pub permanent_address: Option<String>,
    pub pincode: Option<String>,
    #[serde(default)]
    pub status: ApprovalStatus,
    pub photo_url: Option<String>,
    pub nominee_name: Option<String>,
    pub nominee_relation: Option<String>,
    pub nominee_contact: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Joined view row: membership plus resolved area/district display names.
///
/// The view may omit `created_at`; callers backfill it from the base table
/// when eligibility needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberWithNames {
    pub id: Option<i64>,
    pub civil_id: String,
    pub dob: String,
    pub name: String,
    pub father_name: Option<String>,
    pub family_name: Option<String>,
    pub district_id: Option<i64>,
    pub district_name: Option<String>,
    pub area_id: Option<i64>,
    pub area_name: Option<String>,
    pub mobile_number: String,
    pub blood_group: Option<String>,
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "medical_flag")]
    pub medical: bool,
    pub local_address: Option<String>,
    pub permanent_address: Option<String>,
    pub pincode: Option<String>,
    #[serde(default)]
    pub status: ApprovalStatus,
    pub photo_url: Option<String>,
    pub nominee_name: Option<String>,
    pub nominee_relation: Option<String>,
    pub nominee_contact: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl MemberWithNames {
    /// The `(civil_id, dob)` pair every gateway read/write keys on.
    pub fn natural_key(&self) -> (&str, &str) {
        (&self.civil_id, &self.dob)
    }
}

/// Save payload written to the base table.
///
/// Status is forced to `Pending` on every save: re-submission always
/// requires re-approval, including edits to a previously approved record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPayload {
    pub civil_id: String,
    pub dob: String,
    pub name: String,
    pub father_name: Option<String>,
    pub family_name: Option<String>,
    pub district_id: Option<i64>,
    pub area_id: Option<i64>,
    pub mobile_number: String,
    pub blood_group: Option<String>,
    pub gender: Option<String>,
    pub medical: bool,
    pub local_address: Option<String>,
    pub permanent_address: Option<String>,
    pub pincode: Option<String>,
    pub status: ApprovalStatus,
    pub last_update: String,
    pub nominee_name: Option<String>,
    pub nominee_relation: Option<String>,
    pub nominee_contact: Option<String>,
    pub photo_url: Option<String>,
}
