//! Lifecycle controller
//!
//! Owns one member record per flow: populate from the cache, gate medical
//! enrollment, validate and persist edits, and resync on realtime status
//! changes. Every validation failure aborts before the first gateway call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use validator::Validate;

use shared::{ApprovalStatus, MemberRecord, MemberWithNames};

use super::form::MemberForm;
use super::photo::compress_photo;
use super::{
    FlowContext, FlowMode, LifecycleState, LoadedPage, LookupOutcome, MedicalGate, NextPage,
    Notice, RefreshOutcome, SaveOutcome,
};
use crate::cache::RecordCache;
use crate::eligibility;
use crate::error::{FlowError, FlowResult};
use crate::gateway::{ChangeFeed, MemberChange, MembershipGateway};

const MSG_FILL_REQUIRED: &str = "Please fill all required fields.";
const MSG_PHOTO_REQUIRED: &str = "Profile photo is required. Please upload a photo.";
const MSG_MEDICAL_LOCKED: &str =
    "Medical scheme is available only after 1 year from membership creation.";
const MSG_FILL_NOMINEE: &str = "Please fill all nominee details for medical insurance.";
const MSG_NO_MATCH: &str = "No matching member found.";
const MSG_NEW_MEMBER_MEDICAL: &str =
    "Medical eligibility opens one year after membership creation.";

/// Medical checkbox gating for the current context.
///
/// A blocked gate freezes the flag in both directions: an ineligible member
/// cannot enroll, and an already-enrolled member is never silently
/// unenrolled.
pub fn medical_gate(ctx: &FlowContext, now: DateTime<Utc>) -> MedicalGate {
    let ineligible = ctx.read_only
        || ctx.mode.is_new()
        || eligibility::is_new_member(ctx.created_at, now);
    if !ineligible {
        return MedicalGate::Enabled;
    }
    let message = if ctx.mode.is_new() {
        MSG_NEW_MEMBER_MEDICAL.to_string()
    } else {
        let remaining = eligibility::remaining_message(ctx.created_at, now);
        if remaining.is_empty() { MSG_MEDICAL_LOCKED.to_string() } else { remaining }
    };
    MedicalGate::Blocked { message }
}

/// Result of toggling the medical checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedicalToggle {
    /// The gate is blocked; the flag is unchanged and the eligibility
    /// message is surfaced.
    Reverted { message: String },
    /// Enrollment needs the consent step before the flag becomes true.
    ConsentRequired,
    /// The flag was switched off; nominee fields are hidden.
    NomineeHidden,
}

/// Result of the consent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedicalConsent {
    /// Consent accepted: flag set, nominee fields revealed.
    Enrolled,
    /// Consent rejected: flag reverted, nominee fields hidden.
    Declined,
}

/// Toggle the medical checkbox.
pub fn toggle_medical(form: &mut MemberForm, gate: &MedicalGate, enable: bool) -> MedicalToggle {
    if let MedicalGate::Blocked { message } = gate {
        return MedicalToggle::Reverted { message: message.clone() };
    }
    if enable {
        // The flag only becomes true once consent is accepted.
        MedicalToggle::ConsentRequired
    } else {
        form.medical = false;
        MedicalToggle::NomineeHidden
    }
}

/// Complete the consent step opened by [`toggle_medical`].
pub fn resolve_consent(form: &mut MemberForm, agreed: bool) -> MedicalConsent {
    if agreed {
        form.medical = true;
        MedicalConsent::Enrolled
    } else {
        form.medical = false;
        MedicalConsent::Declined
    }
}

/// Merge the re-fetched view row with the just-saved base row.
///
/// Submitted values win over stale view values; the view stays
/// authoritative for the server-computed display names; the submitted
/// pincode is preserved explicitly.
pub fn merge_saved(
    view: Option<MemberWithNames>,
    saved: MemberRecord,
    pincode: Option<String>,
) -> MemberWithNames {
    let mut merged = view.unwrap_or_else(|| record_as_view(&saved));

    merged.id = saved.id.or(merged.id);
    merged.civil_id = saved.civil_id;
    merged.dob = saved.dob;
    merged.name = saved.name;
    merged.father_name = saved.father_name;
    merged.family_name = saved.family_name;
    merged.district_id = saved.district_id;
    merged.area_id = saved.area_id;
    merged.mobile_number = saved.mobile_number;
    merged.blood_group = saved.blood_group;
    merged.gender = saved.gender;
    merged.medical = saved.medical;
    merged.local_address = saved.local_address;
    merged.permanent_address = saved.permanent_address;
    merged.status = saved.status;
    merged.photo_url = saved.photo_url;
    merged.nominee_name = saved.nominee_name;
    merged.nominee_relation = saved.nominee_relation;
    merged.nominee_contact = saved.nominee_contact;
    merged.created_at = saved.created_at.or(merged.created_at);
    merged.updated_at = saved.updated_at.or(merged.updated_at);
    merged.pincode = pincode;
    merged
}

fn record_as_view(record: &MemberRecord) -> MemberWithNames {
    MemberWithNames {
        id: record.id,
        civil_id: record.civil_id.clone(),
        dob: record.dob.clone(),
        name: record.name.clone(),
        father_name: record.father_name.clone(),
        family_name: record.family_name.clone(),
        district_id: record.district_id,
        district_name: None,
        area_id: record.area_id,
        area_name: None,
        mobile_number: record.mobile_number.clone(),
        blood_group: record.blood_group.clone(),
        gender: record.gender.clone(),
        medical: record.medical,
        local_address: record.local_address.clone(),
        permanent_address: record.permanent_address.clone(),
        pincode: record.pincode.clone(),
        status: record.status,
        photo_url: record.photo_url.clone(),
        nominee_name: record.nominee_name.clone(),
        nominee_relation: record.nominee_relation.clone(),
        nominee_contact: record.nominee_contact.clone(),
        created_at: record.created_at.clone(),
        updated_at: record.updated_at.clone(),
    }
}

/// The member record lifecycle controller.
pub struct MemberFlow {
    gateway: Arc<dyn MembershipGateway>,
    cache: RecordCache,
}

impl MemberFlow {
    pub fn new(gateway: Arc<dyn MembershipGateway>, cache: RecordCache) -> Self {
        Self { gateway, cache }
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Look a member up by natural key and cache the hit.
    ///
    /// A gateway failure reads as "no match" to the user, like an empty
    /// result; the underlying error is logged.
    pub async fn lookup(&self, civil_id: &str, dob: &str) -> FlowResult<LookupOutcome> {
        let dob = shared::util::date_part(dob);
        match self.gateway.find_view(civil_id, dob).await {
            Ok(Some(row)) => {
                self.cache.store(&row)?;
                Ok(LookupOutcome::Found { next: NextPage::Member })
            }
            Ok(None) => Ok(LookupOutcome::NotFound { notice: Notice::alert(MSG_NO_MATCH) }),
            Err(e) => {
                warn!(civil_id = %civil_id, error = %e, "lookup failed");
                Ok(LookupOutcome::NotFound { notice: Notice::alert(MSG_NO_MATCH) })
            }
        }
    }

    /// Populate the member page.
    pub async fn load(&self, ctx: &mut FlowContext) -> FlowResult<LoadedPage> {
        let now = Utc::now();

        let (districts, areas) = tokio::join!(self.gateway.districts(), self.gateway.areas());
        let districts = districts.unwrap_or_else(|e| {
            warn!(error = %e, "district list fetch failed");
            Vec::new()
        });
        let areas = areas.unwrap_or_else(|e| {
            warn!(error = %e, "area list fetch failed");
            Vec::new()
        });

        match ctx.mode.clone() {
            FlowMode::New { civil_id } => {
                ctx.read_only = false;
                ctx.created_at = None;
                ctx.already_enrolled = false;
                Ok(LoadedPage {
                    form: MemberForm::skeleton(&civil_id),
                    state: LifecycleState::Populated { read_only: false },
                    download_available: false,
                    medical_gate: medical_gate(ctx, now),
                    districts,
                    areas,
                })
            }
            FlowMode::Existing => {
                let record = self.cache.load()?.ok_or(FlowError::MissingRecord)?;
                let mut form = MemberForm::from_record(&record);

                ctx.current_photo_url = record.photo_url.clone();
                ctx.created_at = shared::util::parse_timestamp(record.created_at.as_deref());
                ctx.already_enrolled = record.medical;
                ctx.read_only = record.status.is_approved();

                // The view may omit created_at; the base table carries it.
                if ctx.created_at.is_none() {
                    match self.gateway.find_base(&record.civil_id, &record.dob).await {
                        Ok(Some(base)) => {
                            ctx.created_at =
                                shared::util::parse_timestamp(base.created_at.as_deref());
                            ctx.already_enrolled = base.medical || record.medical;
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "could not fetch creation time"),
                    }
                }

                let gate = medical_gate(ctx, now);
                if matches!(gate, MedicalGate::Blocked { .. }) && !ctx.already_enrolled {
                    form.medical = false;
                }

                Ok(LoadedPage {
                    form,
                    state: LifecycleState::Populated { read_only: ctx.read_only },
                    download_available: ctx.read_only,
                    medical_gate: gate,
                    districts,
                    areas,
                })
            }
        }
    }

    /// Validate and persist the form.
    ///
    /// Order: required fields, photo presence, medical eligibility, nominee
    /// completeness - any failure aborts before the first gateway call. A
    /// selected photo is compressed and uploaded before the payload is
    /// built, so the payload always carries a resolved URL; upload failure
    /// degrades to saving without a photo update.
    pub async fn save(&self, ctx: &mut FlowContext, form: &MemberForm) -> FlowResult<SaveOutcome> {
        let now = Utc::now();

        if form.validate().is_err() {
            return Err(FlowError::Validation(MSG_FILL_REQUIRED.into()));
        }
        if ctx.selected_photo.is_none() && ctx.current_photo_url.is_none() {
            return Err(FlowError::Validation(MSG_PHOTO_REQUIRED.into()));
        }
        if form.medical
            && eligibility::enrollment_blocked(
                ctx.mode.is_new(),
                ctx.created_at,
                ctx.read_only,
                ctx.already_enrolled,
                now,
            )
        {
            return Err(FlowError::Validation(MSG_MEDICAL_LOCKED.into()));
        }
        if form.medical && !form.nominee_complete() {
            return Err(FlowError::Validation(MSG_FILL_NOMINEE.into()));
        }

        // The navigation context wins over the form for the civil id.
        let civil_id = match &ctx.mode {
            FlowMode::New { civil_id } if !civil_id.is_empty() => civil_id.clone(),
            _ => form.civil_id.clone(),
        };

        if let Some(photo) = ctx.selected_photo.clone() {
            match compress_photo(&photo.bytes) {
                Ok(jpeg) => {
                    let filename = format!("member_{civil_id}.jpg");
                    match self.gateway.upload_photo(&filename, jpeg).await {
                        Ok(url) => ctx.current_photo_url = Some(url),
                        Err(e) => {
                            warn!(error = %e, "photo upload failed, saving without photo update");
                        }
                    }
                }
                Err(e) => warn!(error = %e, "photo compression failed, saving without photo update"),
            }
        }

        let payload = form.to_payload(&civil_id, ctx.current_photo_url.clone());

        let saved = match &ctx.mode {
            FlowMode::New { .. } => self.gateway.insert(&payload).await?,
            FlowMode::Existing => {
                self.gateway.update(&payload.civil_id, &payload.dob, &payload).await?
            }
        };

        // Re-fetch the joined view so server-computed fields stay
        // authoritative, then reconcile with what was just submitted.
        let view = self.gateway.find_view(&payload.civil_id, &payload.dob).await?;
        let merged = merge_saved(view, saved, payload.pincode.clone());
        self.cache.store(&merged)?;

        let notice = Notice::alert(if ctx.mode.is_new() {
            "Submitted. Await approval."
        } else {
            "Updated. Await approval."
        });
        Ok(SaveOutcome { record: merged, notice, next: NextPage::Landing })
    }

    /// Subscribe to status changes of the record's natural key.
    pub async fn subscribe(&self, civil_id: &str, dob: &str) -> FlowResult<ChangeFeed> {
        Ok(self.gateway.subscribe(civil_id, dob).await?)
    }

    /// Handle a realtime status change: overwrite the cache with the fresh
    /// view row, surface the outcome, and re-enter the lifecycle. In-flight
    /// edits are discarded, never merged.
    pub async fn on_change(
        &self,
        civil_id: &str,
        dob: &str,
        change: &MemberChange,
    ) -> FlowResult<RefreshOutcome> {
        if let Some(row) = self.gateway.find_view(civil_id, dob).await? {
            self.cache.store(&row)?;
        }

        let message = match change.status {
            ApprovalStatus::Approved => "Your membership has been approved!",
            ApprovalStatus::Rejected => "Your membership status has been updated to rejected.",
            ApprovalStatus::Pending => "Your data was refreshed externally.",
        };
        Ok(RefreshOutcome {
            notice: Notice::alert(message),
            state: LifecycleState::Loading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: &str) -> MemberRecord {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "civil_id": "123",
            "dob": "1990-01-01",
            "name": "Edited Name",
            "mobile_number": "555",
            "pincode": "676001",
            "status": status,
            "updated_at": "2026-08-01T10:00:00+00:00"
        }))
        .unwrap()
    }

    fn view_row() -> MemberWithNames {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "civil_id": "123",
            "dob": "1990-01-01",
            "name": "Stale Name",
            "mobile_number": "555",
            "area_name": "East Side",
            "district_name": "North",
            "status": "p",
            "created_at": "2020-01-01T00:00:00+00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_merge_submitted_wins_view_names_kept() {
        let merged = merge_saved(Some(view_row()), record("p"), Some("999999".into()));

        assert_eq!(merged.name, "Edited Name");
        assert_eq!(merged.area_name.as_deref(), Some("East Side"));
        assert_eq!(merged.district_name.as_deref(), Some("North"));
        assert_eq!(merged.pincode.as_deref(), Some("999999"));
        assert_eq!(merged.created_at.as_deref(), Some("2020-01-01T00:00:00+00:00"));
        assert_eq!(merged.updated_at.as_deref(), Some("2026-08-01T10:00:00+00:00"));
    }

    #[test]
    fn test_merge_without_view_row() {
        let merged = merge_saved(None, record("p"), None);
        assert_eq!(merged.name, "Edited Name");
        assert!(merged.area_name.is_none());
        assert!(merged.pincode.is_none());
    }

    #[test]
    fn test_gate_blocked_for_new_mode() {
        let ctx = FlowContext::new_record("123");
        let gate = medical_gate(&ctx, Utc::now());
        assert!(matches!(gate, MedicalGate::Blocked { .. }));
    }

    #[test]
    fn test_gate_enabled_for_old_record() {
        let mut ctx = FlowContext::existing();
        ctx.created_at = Some(Utc::now() - Duration::days(400));
        assert_eq!(medical_gate(&ctx, Utc::now()), MedicalGate::Enabled);
    }

    #[test]
    fn test_gate_blocked_message_carries_unlock_info() {
        let mut ctx = FlowContext::existing();
        ctx.created_at = Some(Utc::now() - Duration::days(10));
        match medical_gate(&ctx, Utc::now()) {
            MedicalGate::Blocked { message } => {
                assert!(message.contains("Medical available after"), "{message}");
                assert!(message.contains("355"), "{message}");
            }
            other => panic!("expected blocked gate, got {other:?}"),
        }
    }

    #[test]
    fn test_toggle_blocked_never_changes_flag() {
        let gate = MedicalGate::Blocked { message: "locked".into() };

        let mut form = MemberForm::default();
        assert!(matches!(
            toggle_medical(&mut form, &gate, true),
            MedicalToggle::Reverted { .. }
        ));
        assert!(!form.medical);

        form.medical = true;
        assert!(matches!(
            toggle_medical(&mut form, &gate, false),
            MedicalToggle::Reverted { .. }
        ));
        assert!(form.medical, "enrolled member must not be silently unenrolled");
    }

    #[test]
    fn test_toggle_on_requires_consent() {
        let mut form = MemberForm::default();
        let toggle = toggle_medical(&mut form, &MedicalGate::Enabled, true);
        assert_eq!(toggle, MedicalToggle::ConsentRequired);
        assert!(!form.medical, "flag stays false until consent is accepted");

        assert_eq!(resolve_consent(&mut form, true), MedicalConsent::Enrolled);
        assert!(form.medical);
    }

    #[test]
    fn test_consent_declined_reverts() {
        let mut form = MemberForm::default();
        toggle_medical(&mut form, &MedicalGate::Enabled, true);
        assert_eq!(resolve_consent(&mut form, false), MedicalConsent::Declined);
        assert!(!form.medical);
    }

    #[test]
    fn test_toggle_off_hides_nominee() {
        let mut form = MemberForm { medical: true, ..Default::default() };
        let toggle = toggle_medical(&mut form, &MedicalGate::Enabled, false);
        assert_eq!(toggle, MedicalToggle::NomineeHidden);
        assert!(!form.medical);
    }
}
