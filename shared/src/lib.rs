//! Shared types for the membership portal
//!
//! Domain models used across the application and the card renderer:
//! member records, the joined view row, approval status, reference lists.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    ApprovalStatus, MemberPayload, MemberRecord, MemberWithNames, ReferenceItem,
};
