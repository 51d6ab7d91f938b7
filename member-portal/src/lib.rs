//! Membership portal
//!
//! Client application for the hosted membership backend: record lookup,
//! registration editing with medical-scheme eligibility, save with
//! re-approval, realtime status refresh, and ID-card download.
//!
//! Persistence, authentication and row-level querying are delegated to the
//! remote data gateway; this crate owns the lifecycle of one member record
//! and the sequencing around it.

pub mod cache;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod logger;

pub use cache::RecordCache;
pub use config::Config;
pub use error::{FlowError, FlowResult};
pub use flow::MemberFlow;
pub use gateway::{GatewayError, GatewayResult, MembershipGateway};
