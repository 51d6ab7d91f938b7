//! Lifecycle flow tests against a scripted in-memory gateway.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::mpsc;

use member_portal::flow::{
    FlowContext, LifecycleState, MedicalGate, MemberFlow, MemberForm, PhotoFile,
};
use member_portal::gateway::{
    ChangeFeed, GatewayError, GatewayResult, MemberChange, MembershipGateway,
};
use member_portal::{FlowError, RecordCache};
use shared::{ApprovalStatus, MemberPayload, MemberRecord, MemberWithNames, ReferenceItem};

#[derive(Debug, Default, Clone)]
struct Calls {
    find_view: usize,
    find_base: usize,
    insert: usize,
    update: usize,
    upload: usize,
}

/// Scripted gateway double. Writes update the stored view row the way the
/// real backend's joined view would reflect them.
struct MockGateway {
    view_row: Mutex<Option<MemberWithNames>>,
    fail_upload: bool,
    calls: Mutex<Calls>,
    feed_tx: Mutex<Option<mpsc::Sender<MemberChange>>>,
}

impl MockGateway {
    fn with_view(row: Option<MemberWithNames>) -> Self {
        Self {
            view_row: Mutex::new(row),
            fail_upload: false,
            calls: Mutex::new(Calls::default()),
            feed_tx: Mutex::new(None),
        }
    }

    fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    fn total_calls(&self) -> usize {
        let c = self.calls();
        c.find_view + c.find_base + c.insert + c.update + c.upload
    }

    fn apply_write(&self, payload: &MemberPayload) -> MemberRecord {
        let mut guard = self.view_row.lock().unwrap();
        let created_at = guard
            .as_ref()
            .and_then(|v| v.created_at.clone())
            .or_else(|| Some(Utc::now().to_rfc3339()));
        let stored = stored_record(payload, 7, created_at);

        let names = guard
            .as_ref()
            .map(|v| (v.area_name.clone(), v.district_name.clone()))
            .unwrap_or((Some("East Side".into()), Some("North".into())));
        *guard = Some(view_of(&stored, names.0, names.1));
        stored
    }
}

#[async_trait]
impl MembershipGateway for MockGateway {
    async fn find_view(&self, civil_id: &str, dob: &str) -> GatewayResult<Option<MemberWithNames>> {
        self.calls.lock().unwrap().find_view += 1;
        let row = self.view_row.lock().unwrap().clone();
        Ok(row.filter(|r| r.civil_id == civil_id && r.dob == dob))
    }

    async fn find_base(&self, civil_id: &str, dob: &str) -> GatewayResult<Option<MemberRecord>> {
        self.calls.lock().unwrap().find_base += 1;
        let row = self.view_row.lock().unwrap().clone();
        Ok(row
            .filter(|r| r.civil_id == civil_id && r.dob == dob)
            .map(|v| base_of(&v)))
    }

    async fn insert(&self, payload: &MemberPayload) -> GatewayResult<MemberRecord> {
        self.calls.lock().unwrap().insert += 1;
        Ok(self.apply_write(payload))
    }

    async fn update(
        &self,
        _civil_id: &str,
        _dob: &str,
        payload: &MemberPayload,
    ) -> GatewayResult<MemberRecord> {
        self.calls.lock().unwrap().update += 1;
        Ok(self.apply_write(payload))
    }

    async fn upload_photo(&self, filename: &str, _bytes: Vec<u8>) -> GatewayResult<String> {
        self.calls.lock().unwrap().upload += 1;
        if self.fail_upload {
            return Err(GatewayError::Internal("storage unavailable".into()));
        }
        Ok(format!("https://storage.example/profile/{filename}"))
    }

    async fn districts(&self) -> GatewayResult<Vec<ReferenceItem>> {
        Ok(vec![ReferenceItem { id: 1, name: "North".into() }])
    }

    async fn areas(&self) -> GatewayResult<Vec<ReferenceItem>> {
        Ok(vec![ReferenceItem { id: 2, name: "East Side".into() }])
    }

    async fn subscribe(&self, _civil_id: &str, _dob: &str) -> GatewayResult<ChangeFeed> {
        let (tx, rx) = mpsc::channel(4);
        *self.feed_tx.lock().unwrap() = Some(tx);
        Ok(ChangeFeed::new(rx, None))
    }
}

fn stored_record(payload: &MemberPayload, id: i64, created_at: Option<String>) -> MemberRecord {
    MemberRecord {
        id: Some(id),
        civil_id: payload.civil_id.clone(),
        dob: payload.dob.clone(),
        name: payload.name.clone(),
        father_name: payload.father_name.clone(),
        family_name: payload.family_name.clone(),
        district_id: payload.district_id,
        area_id: payload.area_id,
        mobile_number: payload.mobile_number.clone(),
        blood_group: payload.blood_group.clone(),
        gender: payload.gender.clone(),
        medical: payload.medical,
        local_address: payload.local_address.clone(),
        permanent_address: payload.permanent_address.clone(),
        pincode: payload.pincode.clone(),
        status: payload.status,
        photo_url: payload.photo_url.clone(),
        nominee_name: payload.nominee_name.clone(),
        nominee_relation: payload.nominee_relation.clone(),
        nominee_contact: payload.nominee_contact.clone(),
        created_at,
        updated_at: Some(Utc::now().to_rfc3339()),
    }
}

fn view_of(
    record: &MemberRecord,
    area_name: Option<String>,
    district_name: Option<String>,
) -> MemberWithNames {
    let mut json = serde_json::to_value(record).unwrap();
    json["area_name"] = serde_json::to_value(&area_name).unwrap();
    json["district_name"] = serde_json::to_value(&district_name).unwrap();
    serde_json::from_value(json).unwrap()
}

fn base_of(view: &MemberWithNames) -> MemberRecord {
    let json = serde_json::to_value(view).unwrap();
    serde_json::from_value(json).unwrap()
}

/// A fully approved-or-pending seeded view row.
fn seeded_view(status: ApprovalStatus, created_days_ago: i64, medical: bool) -> MemberWithNames {
    serde_json::from_value(serde_json::json!({
        "id": 7,
        "civil_id": "11223344",
        "dob": "1988-02-10",
        "name": "Askar Ali",
        "father_name": "Hamid",
        "family_name": "Ali",
        "district_id": 1,
        "district_name": "North",
        "area_id": 2,
        "area_name": "East Side",
        "mobile_number": "99887766",
        "blood_group": "O+",
        "gender": "M",
        "medical": medical,
        "local_address": "Street 4",
        "permanent_address": "Village Rd",
        "pincode": "676001",
        "status": status.as_code(),
        "photo_url": "https://storage.example/profile/member_11223344.jpg",
        "created_at": (Utc::now() - Duration::days(created_days_ago)).to_rfc3339(),
        "updated_at": "2026-08-01T10:00:00+00:00"
    }))
    .unwrap()
}

fn form_for(view: &MemberWithNames) -> MemberForm {
    MemberForm::from_record(view)
}

struct Harness {
    gateway: Arc<MockGateway>,
    flow: MemberFlow,
    cache: RecordCache,
    _dir: tempfile::TempDir,
}

fn harness(gateway: MockGateway) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let cache = RecordCache::new(dir.path());
    let gateway = Arc::new(gateway);
    let flow = MemberFlow::new(gateway.clone(), cache.clone());
    Harness { gateway, flow, cache, _dir: dir }
}

fn png_bytes() -> Vec<u8> {
    let img = image_stub();
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
    bytes
}

fn image_stub() -> image::RgbaImage {
    image::RgbaImage::from_pixel(8, 8, image::Rgba([50, 60, 70, 255]))
}

// ---- save validation -------------------------------------------------------

#[tokio::test]
async fn save_with_missing_required_field_makes_no_gateway_calls() {
    let view = seeded_view(ApprovalStatus::Pending, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    ctx.current_photo_url = view.photo_url.clone();

    let mut form = form_for(&view);
    form.name.clear();

    let err = h.flow.save(&mut ctx, &form).await.unwrap_err();
    assert!(matches!(err, FlowError::Validation(ref m) if m.contains("required")));
    assert_eq!(h.gateway.total_calls(), 0);
}

#[tokio::test]
async fn save_without_any_photo_aborts_before_gateway() {
    let view = seeded_view(ApprovalStatus::Pending, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));

    let mut ctx = FlowContext::existing();
    let form = form_for(&view);

    let err = h.flow.save(&mut ctx, &form).await.unwrap_err();
    assert!(matches!(err, FlowError::Validation(ref m) if m.contains("photo")));
    assert_eq!(h.gateway.total_calls(), 0);
}

#[tokio::test]
async fn save_medical_with_incomplete_nominee_makes_no_gateway_calls() {
    let view = seeded_view(ApprovalStatus::Pending, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));

    let mut ctx = FlowContext::existing();
    ctx.current_photo_url = view.photo_url.clone();
    ctx.created_at = Some(Utc::now() - Duration::days(400));

    let mut form = form_for(&view);
    form.medical = true;
    form.nominee_name = "Noor".into();
    form.nominee_relation = "Spouse".into();
    form.nominee_contact = String::new();

    let err = h.flow.save(&mut ctx, &form).await.unwrap_err();
    assert!(matches!(err, FlowError::Validation(ref m) if m.contains("nominee")));
    assert_eq!(h.gateway.total_calls(), 0);
}

#[tokio::test]
async fn save_medical_is_blocked_in_new_mode() {
    let h = harness(MockGateway::with_view(None));

    let mut ctx = FlowContext::new_record("55667788");
    ctx.selected_photo = Some(PhotoFile { filename: "me.png".into(), bytes: png_bytes() });

    let mut form = form_for(&seeded_view(ApprovalStatus::Pending, 400, false));
    form.civil_id = "55667788".into();
    form.medical = true;
    form.nominee_name = "Noor".into();
    form.nominee_relation = "Spouse".into();
    form.nominee_contact = "555".into();

    let err = h.flow.save(&mut ctx, &form).await.unwrap_err();
    assert!(matches!(err, FlowError::Validation(ref m) if m.contains("1 year")));
    assert_eq!(h.gateway.total_calls(), 0);
}

// ---- lifecycle -------------------------------------------------------------

#[tokio::test]
async fn approved_record_loads_read_only_with_download_surfaced() {
    let view = seeded_view(ApprovalStatus::Approved, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    let page = h.flow.load(&mut ctx).await.unwrap();

    assert_eq!(page.state, LifecycleState::Populated { read_only: true });
    assert!(page.download_available);
    assert!(matches!(page.medical_gate, MedicalGate::Blocked { .. }));
    assert_eq!(page.form.name, "Askar Ali");
}

#[tokio::test]
async fn load_without_cached_record_is_missing_record() {
    let h = harness(MockGateway::with_view(None));
    let mut ctx = FlowContext::existing();
    let err = h.flow.load(&mut ctx).await.unwrap_err();
    assert!(matches!(err, FlowError::MissingRecord));
}

#[tokio::test]
async fn eligible_record_gets_enabled_medical_gate() {
    let view = seeded_view(ApprovalStatus::Pending, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    let page = h.flow.load(&mut ctx).await.unwrap();
    assert_eq!(page.medical_gate, MedicalGate::Enabled);
}

#[tokio::test]
async fn fresh_record_medical_gate_reports_unlock_date() {
    let view = seeded_view(ApprovalStatus::Pending, 10, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    let page = h.flow.load(&mut ctx).await.unwrap();
    match page.medical_gate {
        MedicalGate::Blocked { message } => {
            assert!(message.contains("Medical available after"), "{message}");
        }
        other => panic!("expected blocked gate, got {other:?}"),
    }
}

#[tokio::test]
async fn created_at_is_backfilled_from_base_table() {
    let mut view = seeded_view(ApprovalStatus::Pending, 400, false);
    let with_created = view.clone();
    view.created_at = None;

    let h = harness(MockGateway::with_view(Some(with_created)));
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    let page = h.flow.load(&mut ctx).await.unwrap();

    assert_eq!(h.gateway.calls().find_base, 1);
    assert!(ctx.created_at.is_some());
    assert_eq!(page.medical_gate, MedicalGate::Enabled);
}

// ---- save round trips ------------------------------------------------------

#[tokio::test]
async fn save_on_approved_record_forces_status_back_to_pending() {
    let view = seeded_view(ApprovalStatus::Approved, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    h.flow.load(&mut ctx).await.unwrap();
    assert!(ctx.read_only);

    let form = form_for(&view);
    let outcome = h.flow.save(&mut ctx, &form).await.unwrap();

    assert_eq!(outcome.record.status, ApprovalStatus::Pending);
    assert_eq!(h.gateway.calls().update, 1);
    assert_eq!(h.gateway.calls().insert, 0);
}

#[tokio::test]
async fn round_trip_preserves_fields_except_status_and_timestamp() {
    let view = seeded_view(ApprovalStatus::Approved, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    let page = h.flow.load(&mut ctx).await.unwrap();

    let outcome = h.flow.save(&mut ctx, &page.form).await.unwrap();
    let record = outcome.record;

    assert_eq!(record.natural_key(), view.natural_key());
    assert_eq!(record.name, view.name);
    assert_eq!(record.mobile_number, view.mobile_number);
    assert_eq!(record.pincode, view.pincode);
    assert_eq!(record.area_name, view.area_name);
    assert_eq!(record.district_name, view.district_name);
    assert_eq!(record.status, ApprovalStatus::Pending);
    assert_ne!(record.updated_at, view.updated_at);

    // The cache now holds the merged record wholesale.
    let cached = h.cache.load().unwrap().unwrap();
    assert_eq!(cached.status, ApprovalStatus::Pending);
}

#[tokio::test]
async fn new_record_save_inserts_with_navigation_civil_id() {
    let h = harness(MockGateway::with_view(None));

    let mut ctx = FlowContext::new_record("55667788");
    ctx.selected_photo = Some(PhotoFile { filename: "me.png".into(), bytes: png_bytes() });

    let mut form = form_for(&seeded_view(ApprovalStatus::Pending, 400, false));
    form.civil_id = "ignored".into();

    let outcome = h.flow.save(&mut ctx, &form).await.unwrap();

    assert_eq!(outcome.record.civil_id, "55667788");
    assert_eq!(h.gateway.calls().insert, 1);
    assert_eq!(h.gateway.calls().upload, 1);
    assert_eq!(
        ctx.current_photo_url.as_deref(),
        Some("https://storage.example/profile/member_55667788.jpg")
    );
}

#[tokio::test]
async fn photo_upload_failure_degrades_to_saving_without_photo() {
    let view = seeded_view(ApprovalStatus::Pending, 400, false);
    let mut gateway = MockGateway::with_view(Some(view.clone()));
    gateway.fail_upload = true;
    let h = harness(gateway);
    h.cache.store(&view).unwrap();

    let mut ctx = FlowContext::existing();
    ctx.selected_photo = Some(PhotoFile { filename: "new.png".into(), bytes: png_bytes() });

    let form = form_for(&view);
    let outcome = h.flow.save(&mut ctx, &form).await.unwrap();

    assert_eq!(h.gateway.calls().upload, 1);
    assert_eq!(h.gateway.calls().update, 1);
    // No photo URL update happened, and the save still went through.
    assert!(ctx.current_photo_url.is_none());
    assert_eq!(outcome.record.status, ApprovalStatus::Pending);
}

// ---- lookup and realtime ---------------------------------------------------

#[tokio::test]
async fn lookup_found_caches_the_row() {
    let view = seeded_view(ApprovalStatus::Pending, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));

    let outcome = h.flow.lookup("11223344", "1988-02-10").await.unwrap();
    assert!(matches!(outcome, member_portal::flow::LookupOutcome::Found { .. }));
    assert!(h.cache.load().unwrap().is_some());
}

#[tokio::test]
async fn lookup_miss_reports_no_match_and_caches_nothing() {
    let h = harness(MockGateway::with_view(None));

    let outcome = h.flow.lookup("999", "1970-01-01").await.unwrap();
    match outcome {
        member_portal::flow::LookupOutcome::NotFound { notice } => {
            assert!(notice.message.contains("No matching member"));
        }
        other => panic!("expected not-found, got {other:?}"),
    }
    assert!(h.cache.load().unwrap().is_none());
}

#[tokio::test]
async fn status_change_overwrites_cache_and_reenters_loading() {
    let approved = seeded_view(ApprovalStatus::Approved, 400, false);
    let h = harness(MockGateway::with_view(Some(approved.clone())));

    // Cache still holds the stale pending row.
    let stale = seeded_view(ApprovalStatus::Pending, 400, false);
    h.cache.store(&stale).unwrap();

    let outcome = h
        .flow
        .on_change("11223344", "1988-02-10", &MemberChange { status: ApprovalStatus::Approved })
        .await
        .unwrap();

    assert_eq!(outcome.state, LifecycleState::Loading);
    assert!(outcome.notice.message.contains("approved"));
    let cached = h.cache.load().unwrap().unwrap();
    assert!(cached.status.is_approved());
}

#[tokio::test]
async fn change_feed_delivers_pushed_events() {
    let view = seeded_view(ApprovalStatus::Pending, 400, false);
    let h = harness(MockGateway::with_view(Some(view.clone())));

    let mut feed = h.flow.subscribe("11223344", "1988-02-10").await.unwrap();
    let tx = h.gateway.feed_tx.lock().unwrap().clone().unwrap();
    tx.send(MemberChange { status: ApprovalStatus::Rejected }).await.unwrap();

    let change = feed.recv().await.unwrap();
    assert_eq!(change.status, ApprovalStatus::Rejected);
}
