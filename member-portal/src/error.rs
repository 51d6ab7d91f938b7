//! Application error types

use thiserror::Error;

use crate::cache::CacheError;
use crate::gateway::GatewayError;

/// Flow-level error type.
///
/// Validation failures carry the exact user-facing message and are raised
/// before any gateway call; gateway and render failures wrap the underlying
/// error and are surfaced generically by the caller.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A validation rule failed; no gateway call was made
    #[error("{0}")]
    Validation(String),

    /// A page expected a cached record and none exists
    #[error("No member data found")]
    MissingRecord,

    /// Remote data gateway call failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Local cache read/write failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Card rendering failed
    #[error("Render error: {0}")]
    Render(#[from] card_render::RenderError),
}

/// Result type for flow operations
pub type FlowResult<T> = Result<T, FlowError>;
