//! Options for listing available Freight

use crate::error::{AvailabilityError, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How verification in several upstream Stages is combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AvailabilityStrategy {
    /// Verified, and soaked, in every listed Stage
    All,

    /// Verified, and soaked, in at least one listed Stage
    #[default]
    OneOf,
}

impl AvailabilityStrategy {
    /// Parse a strategy as authored on a Stage.
    ///
    /// Absent and empty values mean [`AvailabilityStrategy::OneOf`]. Anything
    /// unrecognized is rejected rather than falling back to the default.
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            None | Some("") => Ok(AvailabilityStrategy::OneOf),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for AvailabilityStrategy {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "All" => Ok(AvailabilityStrategy::All),
            "OneOf" => Ok(AvailabilityStrategy::OneOf),
            other => Err(AvailabilityError::InvalidStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for AvailabilityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityStrategy::All => write!(f, "All"),
            AvailabilityStrategy::OneOf => write!(f, "OneOf"),
        }
    }
}

/// Eligibility rules for listing Freight from a Warehouse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFreightOptions {
    /// Freight approved for this Stage is eligible unconditionally
    pub approved_for: Option<String>,

    /// Stages Freight may be verified in
    pub verified_in: Vec<String>,

    /// Raw strategy value, see [`AvailabilityStrategy::parse`]
    pub availability_strategy: Option<String>,

    /// Minimum soak in a qualifying Stage
    pub required_soak_time: Option<Duration>,

    /// Only Freight currently used by this Stage
    pub currently_in: Option<String>,
}

impl ListFreightOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approved_for(mut self, stage: impl Into<String>) -> Self {
        self.approved_for = Some(stage.into());
        self
    }

    pub fn verified_in<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verified_in.extend(stages.into_iter().map(Into::into));
        self
    }

    pub fn availability_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.availability_strategy = Some(strategy.into());
        self
    }

    pub fn required_soak_time(mut self, soak: Duration) -> Self {
        self.required_soak_time = Some(soak);
        self
    }

    pub fn currently_in(mut self, stage: impl Into<String>) -> Self {
        self.currently_in = Some(stage.into());
        self
    }
}
