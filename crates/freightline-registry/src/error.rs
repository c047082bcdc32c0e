//! Registry error types

use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Freight not found: {namespace}/{name}")]
    FreightNotFound { namespace: String, name: String },

    #[error("Stage not found: {namespace}/{name}")]
    StageNotFound { namespace: String, name: String },

    #[error("{kind} already exists: {namespace}/{name}")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("Version conflict on {namespace}/{name}: current {current}, expected {expected}")]
    VersionConflict {
        namespace: String,
        name: String,
        current: u64,
        expected: u64,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    /// Whether the failed write should be retried from a fresh read.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::VersionConflict { .. })
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
