//! Controller error types

use freightline_availability::AvailabilityError;
use freightline_registry::{ConflictAware, RegistryError};
use thiserror::Error;

/// Controller errors
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Availability error: {0}")]
    Availability(#[from] AvailabilityError),

    #[error("Freight not found: {namespace}/{name}")]
    FreightNotFound { namespace: String, name: String },

    #[error("Stage not found: {namespace}/{name}")]
    StageNotFound { namespace: String, name: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Telemetry(String),
}

impl ConflictAware for ControllerError {
    fn is_conflict(&self) -> bool {
        matches!(self, ControllerError::Registry(err) if err.is_conflict())
    }
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;
