//! Error types for the card renderer

use thiserror::Error;

/// Card rendering error types
#[derive(Debug, Error)]
pub enum RenderError {
    /// PNG encoding failed
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Font could not be loaded or parsed
    #[error("Font error: {0}")]
    Font(String),

    /// IO error while writing the download artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene is structurally unusable (zero-sized surface, empty filename)
    #[error("Invalid scene: {0}")]
    InvalidScene(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
