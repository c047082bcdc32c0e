//! Availability error types

use freightline_registry::RegistryError;
use thiserror::Error;

/// Availability errors
#[derive(Debug, Error)]
pub enum AvailabilityError {
    /// The Stage names a strategy other than `All` or `OneOf`
    #[error("Invalid availability strategy: {0:?}")]
    InvalidStrategy(String),

    #[error("Warehouse not found: {namespace}/{name}")]
    WarehouseNotFound { namespace: String, name: String },

    #[error("Failed to list Freight from Warehouse {namespace}/{warehouse}: {source}")]
    ListFreight {
        namespace: String,
        warehouse: String,
        #[source]
        source: RegistryError,
    },

    #[error("Failed to get Warehouse {namespace}/{warehouse}: {source}")]
    GetWarehouse {
        namespace: String,
        warehouse: String,
        #[source]
        source: RegistryError,
    },
}

/// Result type for availability operations
pub type Result<T> = std::result::Result<T, AvailabilityError>;
