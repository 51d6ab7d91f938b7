//! Remote data gateway
//!
//! The hosted backend owns persistence, auth and row-level querying; this
//! module only consumes its contract: natural-key reads against the base
//! table and the joined view, insert/update, photo blob upload, reference
//! lists, and an asynchronous status change feed.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use shared::{ApprovalStatus, MemberPayload, MemberRecord, MemberWithNames, ReferenceItem};

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by the gateway
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A status change reported for the watched record.
#[derive(Debug, Clone)]
pub struct MemberChange {
    pub status: ApprovalStatus,
}

/// Handle to a realtime change subscription.
///
/// Dropping the feed unsubscribes: the backing task is aborted, matching
/// page-teardown semantics.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: mpsc::Receiver<MemberChange>,
    task: Option<JoinHandle<()>>,
}

impl ChangeFeed {
    pub fn new(rx: mpsc::Receiver<MemberChange>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    /// Next change notification; `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<MemberChange> {
        self.rx.recv().await
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The consumed gateway contract.
///
/// Every read and write keys on the `(civil_id, dob)` natural key.
#[async_trait]
pub trait MembershipGateway: Send + Sync {
    /// Joined view row (with area/district display names).
    async fn find_view(&self, civil_id: &str, dob: &str) -> GatewayResult<Option<MemberWithNames>>;

    /// Base table row (carries `created_at` even when the view does not).
    async fn find_base(&self, civil_id: &str, dob: &str) -> GatewayResult<Option<MemberRecord>>;

    /// Insert a new record, returning the stored row.
    async fn insert(&self, payload: &MemberPayload) -> GatewayResult<MemberRecord>;

    /// Update the record matching the natural key, returning the stored row.
    async fn update(
        &self,
        civil_id: &str,
        dob: &str,
        payload: &MemberPayload,
    ) -> GatewayResult<MemberRecord>;

    /// Upsert a photo blob into storage; returns the public URL.
    async fn upload_photo(&self, filename: &str, bytes: Vec<u8>) -> GatewayResult<String>;

    /// District reference list, ordered by name.
    async fn districts(&self) -> GatewayResult<Vec<ReferenceItem>>;

    /// Area reference list, ordered by name.
    async fn areas(&self) -> GatewayResult<Vec<ReferenceItem>>;

    /// Subscribe to status changes of one record.
    async fn subscribe(&self, civil_id: &str, dob: &str) -> GatewayResult<ChangeFeed>;
}
