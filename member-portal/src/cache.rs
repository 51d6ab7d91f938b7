//! Local record cache
//!
//! Exactly one serialized member record under a well-known key, read at
//! flow start by every page that needs member context. The cache is always
//! overwritten wholesale - a fresh fetch or save replaces the whole record,
//! it is never merged in place.

use std::path::{Path, PathBuf};
use thiserror::Error;

use shared::MemberWithNames;

/// Well-known cache key.
const CACHE_FILE: &str = "member.json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single-record cache backed by a JSON file.
#[derive(Debug, Clone)]
pub struct RecordCache {
    file_path: PathBuf,
}

impl RecordCache {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file_path: data_dir.join(CACHE_FILE),
        }
    }

    /// Load the cached record, if any.
    pub fn load(&self) -> Result<Option<MemberWithNames>, CacheError> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.file_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Overwrite the cache with a fresh record.
    pub fn store(&self, record: &MemberWithNames) -> Result<(), CacheError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.file_path, content)?;
        tracing::debug!(civil_id = %record.civil_id, "record cache updated");
        Ok(())
    }

    /// Drop the cached record.
    pub fn clear(&self) -> Result<(), CacheError> {
        if self.file_path.exists() {
            std::fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}
