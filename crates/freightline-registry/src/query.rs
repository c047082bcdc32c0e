//! Indexed Freight predicates
//!
//! A query selects Freight from one origin and may further require approval
//! for a Stage, verification in every one of a set of Stages, and current use
//! by a Stage. Persistent backends map each field onto an index.

use freightline_types::{Freight, FreightOrigin};

/// Conjunctive predicate over Freight of one origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreightQuery {
    /// Producing Warehouse
    pub origin: FreightOrigin,

    /// Stage the Freight must be approved for
    pub approved_for: Option<String>,

    /// Stages the Freight must be verified in, all of them
    pub verified_in: Vec<String>,

    /// Stage that must currently be using the Freight
    pub currently_in: Option<String>,
}

impl FreightQuery {
    pub fn for_origin(origin: FreightOrigin) -> Self {
        Self {
            origin,
            approved_for: None,
            verified_in: Vec::new(),
            currently_in: None,
        }
    }

    pub fn approved_for(mut self, stage: impl Into<String>) -> Self {
        self.approved_for = Some(stage.into());
        self
    }

    pub fn verified_in(mut self, stage: impl Into<String>) -> Self {
        self.verified_in.push(stage.into());
        self
    }

    pub fn verified_in_all<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verified_in.extend(stages.into_iter().map(Into::into));
        self
    }

    pub fn currently_in(mut self, stage: Option<String>) -> Self {
        self.currently_in = stage;
        self
    }

    /// Evaluate the predicate against a Freight.
    pub fn matches(&self, freight: &Freight) -> bool {
        freight.origin == self.origin
            && self
                .approved_for
                .as_deref()
                .map_or(true, |stage| freight.is_approved_for(stage))
            && self.verified_in.iter().all(|stage| freight.is_verified_in(stage))
            && self
                .currently_in
                .as_deref()
                .map_or(true, |stage| freight.is_currently_in(stage))
    }
}
