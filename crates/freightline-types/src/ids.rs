//! Identifying types shared by every Freightline record
//!
//! Records are namespaced and carry a resource version used by the
//! persistence layer for optimistic concurrency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of resource that produced a Freight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OriginKind {
    #[default]
    Warehouse,
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginKind::Warehouse => write!(f, "Warehouse"),
        }
    }
}

/// Identifies the Warehouse a Freight came from.
///
/// Immutable once the Freight exists. The string form `Kind/name` is part of
/// the Freight identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FreightOrigin {
    /// Producer kind
    pub kind: OriginKind,

    /// Producer name
    pub name: String,
}

impl FreightOrigin {
    pub fn warehouse(name: impl Into<String>) -> Self {
        Self {
            kind: OriginKind::Warehouse,
            name: name.into(),
        }
    }
}

impl fmt::Display for FreightOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Metadata common to all persisted records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Namespace (project) the record lives in
    pub namespace: String,

    /// Unique name within the namespace
    pub name: String,

    /// Version token bumped by the store on every write
    #[serde(default)]
    pub resource_version: u64,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            resource_version: 0,
            created_at: None,
        }
    }
}

impl fmt::Display for ObjectMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
