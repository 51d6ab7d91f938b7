//! Data models
//!
//! Shared between the portal flows and the card renderer. Field names match
//! the gateway's column names; tolerant value normalization happens here, at
//! the serde boundary, so downstream code only sees strict types.

pub mod member;
pub mod reference;
pub mod serde_helpers;

// Re-exports
pub use member::*;
pub use reference::*;
