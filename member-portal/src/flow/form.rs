//! Member form payload

use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::{ApprovalStatus, MemberPayload, MemberWithNames};

/// The editable registration form.
///
/// Every string field listed with `length(min = 1)` is required; the
/// conditional rules (photo presence, nominee-iff-medical, eligibility)
/// live in the controller because they depend on flow context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MemberForm {
    #[validate(length(min = 1))]
    pub civil_id: String,
    #[validate(length(min = 1))]
    pub dob: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub father_name: String,
    #[validate(length(min = 1))]
    pub family_name: String,
    #[validate(required)]
    pub district_id: Option<i64>,
    #[validate(required)]
    pub area_id: Option<i64>,
    #[validate(length(min = 1))]
    pub mobile_number: String,
    #[validate(length(min = 1))]
    pub blood_group: String,
    #[validate(length(min = 1))]
    pub gender: String,
    #[validate(length(min = 1))]
    pub local_address: String,
    #[validate(length(min = 1))]
    pub permanent_address: String,
    #[validate(length(min = 1))]
    pub pincode: String,
    #[serde(default)]
    pub medical: bool,
    #[serde(default)]
    pub nominee_name: String,
    #[serde(default)]
    pub nominee_relation: String,
    #[serde(default)]
    pub nominee_contact: String,
}

impl MemberForm {
    /// Skeleton form for a never-saved record.
    pub fn skeleton(civil_id: &str) -> Self {
        Self {
            civil_id: civil_id.to_string(),
            ..Default::default()
        }
    }

    /// Populate every field from a cached record.
    pub fn from_record(record: &MemberWithNames) -> Self {
        Self {
            civil_id: record.civil_id.clone(),
            dob: shared::util::date_part(&record.dob).to_string(),
            name: record.name.clone(),
            father_name: record.father_name.clone().unwrap_or_default(),
            family_name: record.family_name.clone().unwrap_or_default(),
            district_id: record.district_id,
            area_id: record.area_id,
            mobile_number: record.mobile_number.clone(),
            blood_group: record.blood_group.clone().unwrap_or_default(),
            gender: record.gender.clone().unwrap_or_default(),
            local_address: record.local_address.clone().unwrap_or_default(),
            permanent_address: record.permanent_address.clone().unwrap_or_default(),
            pincode: record.pincode.clone().unwrap_or_default(),
            medical: record.medical,
            nominee_name: record.nominee_name.clone().unwrap_or_default(),
            nominee_relation: record.nominee_relation.clone().unwrap_or_default(),
            nominee_contact: record.nominee_contact.clone().unwrap_or_default(),
        }
    }

    /// All three nominee fields are filled.
    pub fn nominee_complete(&self) -> bool {
        !self.nominee_name.trim().is_empty()
            && !self.nominee_relation.trim().is_empty()
            && !self.nominee_contact.trim().is_empty()
    }

    /// Build the gateway payload.
    ///
    /// Status is forced to `Pending` unconditionally: every save, including
    /// an edit of an approved record, requires re-approval. Empty optional
    /// fields become nulls.
    pub fn to_payload(&self, civil_id: &str, photo_url: Option<String>) -> MemberPayload {
        MemberPayload {
            civil_id: civil_id.to_string(),
            dob: shared::util::date_part(&self.dob).to_string(),
            name: self.name.clone(),
            father_name: none_if_empty(&self.father_name),
            family_name: none_if_empty(&self.family_name),
            district_id: self.district_id,
            area_id: self.area_id,
            mobile_number: self.mobile_number.clone(),
            blood_group: none_if_empty(&self.blood_group),
            gender: none_if_empty(&self.gender),
            medical: self.medical,
            local_address: none_if_empty(&self.local_address),
            permanent_address: none_if_empty(&self.permanent_address),
            pincode: none_if_empty(&self.pincode),
            status: ApprovalStatus::Pending,
            last_update: shared::util::now_rfc3339(),
            nominee_name: none_if_empty(&self.nominee_name),
            nominee_relation: none_if_empty(&self.nominee_relation),
            nominee_contact: none_if_empty(&self.nominee_contact),
            photo_url,
        }
    }
}

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
