//! Member record lifecycle flows
//!
//! One member record per flow. All state that used to be page-global lives
//! in an explicit [`FlowContext`] passed through the operations, so nothing
//! depends on initialization order.

mod controller;
mod download;
mod form;
mod photo;

pub use controller::{
    MedicalConsent, MedicalToggle, MemberFlow, medical_gate, merge_saved, resolve_consent,
    toggle_medical,
};
pub use download::{CardDownloader, CardVariant, DownloadArtifact, DownloadOutcome, REDIRECT_DELAY};
pub use form::MemberForm;
pub use photo::compress_photo;

use chrono::{DateTime, Utc};
use shared::ReferenceItem;

/// How the member page was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowMode {
    /// Registration of a record that has never been saved; the civil id is
    /// carried in from the navigation context.
    New { civil_id: String },
    /// Editing the record held in the local cache.
    Existing,
}

impl FlowMode {
    pub fn is_new(&self) -> bool {
        matches!(self, FlowMode::New { .. })
    }
}

/// A photo file the user selected but has not uploaded yet.
#[derive(Debug, Clone)]
pub struct PhotoFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-flow mutable state.
#[derive(Debug)]
pub struct FlowContext {
    pub mode: FlowMode,
    pub created_at: Option<DateTime<Utc>>,
    pub read_only: bool,
    /// The record already carries `medical = true`; enrollment is
    /// grandfathered and must never be silently dropped.
    pub already_enrolled: bool,
    pub selected_photo: Option<PhotoFile>,
    pub current_photo_url: Option<String>,
}

impl FlowContext {
    pub fn new_record(civil_id: impl Into<String>) -> Self {
        Self::with_mode(FlowMode::New { civil_id: civil_id.into() })
    }

    pub fn existing() -> Self {
        Self::with_mode(FlowMode::Existing)
    }

    fn with_mode(mode: FlowMode) -> Self {
        Self {
            mode,
            created_at: None,
            read_only: false,
            already_enrolled: false,
            selected_photo: None,
            current_photo_url: None,
        }
    }
}

/// Lifecycle state of the member page.
///
/// Terminal per flow entry: a realtime change discards in-flight edits and
/// re-enters from `Loading` rather than mutating a populated page in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Loading,
    Populated { read_only: bool },
}

/// Whether the medical checkbox is currently usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedicalGate {
    Enabled,
    Blocked { message: String },
}

/// User-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    /// Blocking notices interrupt the user (alerts); the rest are
    /// transient (snackbars).
    pub blocking: bool,
}

impl Notice {
    pub fn alert(message: impl Into<String>) -> Self {
        Self { message: message.into(), blocking: true }
    }

    pub fn snackbar(message: impl Into<String>) -> Self {
        Self { message: message.into(), blocking: false }
    }
}

/// Where a flow sends the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    Stay,
    Landing,
    Member,
}

/// Result of a lookup.
#[derive(Debug)]
pub enum LookupOutcome {
    Found { next: NextPage },
    NotFound { notice: Notice },
}

/// A populated member page.
#[derive(Debug)]
pub struct LoadedPage {
    pub form: MemberForm,
    pub state: LifecycleState,
    /// The card download action is surfaced only for approved records.
    pub download_available: bool,
    pub medical_gate: MedicalGate,
    pub districts: Vec<ReferenceItem>,
    pub areas: Vec<ReferenceItem>,
}

/// Result of a successful save.
#[derive(Debug)]
pub struct SaveOutcome {
    pub record: shared::MemberWithNames,
    pub notice: Notice,
    pub next: NextPage,
}

/// Result of handling a realtime change notification.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub notice: Notice,
    /// Always `Loading`: the flow re-enters from scratch.
    pub state: LifecycleState,
}
