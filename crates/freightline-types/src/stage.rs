//! Stage types
//!
//! A Stage requests Freight from Warehouses, either directly or through
//! upstream Stages, and keeps bounded history of the Freight it used and of
//! its verification attempts.

use crate::history::{FreightHistory, FreightReference, VerificationHistory, VerificationInfo};
use crate::ids::{FreightOrigin, ObjectMeta};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A deployment target in a promotion pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: StageSpec,

    #[serde(default)]
    pub status: StageStatus,
}

impl Stage {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: StageSpec::default(),
            status: StageStatus::default(),
        }
    }

    pub fn with_request(mut self, request: FreightRequest) -> Self {
        self.spec.requested_freight.push(request);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }
}

/// Desired state of a Stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Freight this Stage accepts, one entry per origin
    #[serde(default)]
    pub requested_freight: Vec<FreightRequest>,
}

/// Request for Freight from one origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightRequest {
    pub origin: FreightOrigin,

    #[serde(default)]
    pub sources: FreightSources,
}

impl FreightRequest {
    /// Accept any Freight straight from the Warehouse.
    pub fn direct(origin: FreightOrigin) -> Self {
        Self {
            origin,
            sources: FreightSources {
                direct: true,
                ..Default::default()
            },
        }
    }

    /// Accept Freight once it is verified in upstream Stages.
    pub fn from_stages<I, S>(origin: FreightOrigin, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origin,
            sources: FreightSources {
                stages: stages.into_iter().map(Into::into).collect(),
                ..Default::default()
            },
        }
    }

    pub fn with_required_soak_time(mut self, soak: Duration) -> Self {
        self.sources.required_soak_time = Some(soak);
        self
    }

    pub fn with_availability_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.sources.availability_strategy = Some(strategy.into());
        self
    }
}

/// Where requested Freight may come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreightSources {
    /// Freight may come straight from the Warehouse
    #[serde(default)]
    pub direct: bool,

    /// Upstream Stages Freight must have been verified in
    #[serde(default)]
    pub stages: Vec<String>,

    /// Minimum soak in an upstream Stage before Freight is available
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::duration_serde::option"
    )]
    pub required_soak_time: Option<Duration>,

    /// `All` or `OneOf` as authored; parsed when availability is resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_strategy: Option<String>,
}

/// Observed state of a Stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageStatus {
    #[serde(default)]
    pub freight_history: FreightHistory,

    #[serde(default)]
    pub verification_history: VerificationHistory,
}

impl StageStatus {
    /// Freight the Stage is using now.
    pub fn current_freight(&self) -> Option<&FreightReference> {
        self.freight_history.top()
    }

    /// Latest verification attempt.
    pub fn current_verification(&self) -> Option<&VerificationInfo> {
        self.verification_history.top()
    }
}
