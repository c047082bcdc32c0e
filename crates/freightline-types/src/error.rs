//! Error types for freightline-types.
//!
//! Identity, lifecycle and history operations are total; only the opaque
//! metadata store can fail, and only on (de)serialization.

use thiserror::Error;

/// Errors reading or writing Freight metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Value could not be encoded as JSON.
    #[error("failed to serialize metadata value for key {key:?}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored value does not decode into the requested type.
    #[error("failed to deserialize metadata value for key {key:?}: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
