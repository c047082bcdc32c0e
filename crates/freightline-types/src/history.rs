//! Bounded history stacks kept in a Stage's status
//!
//! Both stacks are most-recent-first and hold at most [`MAX_STACK_DEPTH`]
//! entries. They have two distinct mutation entry points:
//!
//! - [`HistoryStack::push`] prepends blindly, so repeated entries are kept
//! - [`HistoryStack::update_or_push`] first removes entries sharing a key with
//!   the new items, so an entry appears once, at its newest position

use crate::freight::{ArtifactReference, Chart, Freight, GitCommit, Image};
use crate::ids::FreightOrigin;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of entries retained by a history stack.
pub const MAX_STACK_DEPTH: usize = 10;

/// Entry of a history stack, identified by a dedupe key
pub trait StackEntry {
    fn stack_key(&self) -> &str;
}

/// Bounded, most-recent-first stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryStack<T> {
    entries: Vec<T>,
}

impl<T> Default for HistoryStack<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: StackEntry> HistoryStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `items` in the given order, keeping existing duplicates.
    pub fn push(&mut self, items: impl IntoIterator<Item = T>) {
        let mut entries: Vec<T> = items.into_iter().collect();
        entries.append(&mut self.entries);
        entries.truncate(MAX_STACK_DEPTH);
        self.entries = entries;
    }

    /// Remove entries keyed like any of `items`, then prepend `items`.
    ///
    /// Unaffected entries keep their relative order behind the new items.
    pub fn update_or_push(&mut self, items: impl IntoIterator<Item = T>) {
        let items: Vec<T> = items.into_iter().collect();
        let keys: HashSet<String> = items.iter().map(|i| i.stack_key().to_string()).collect();
        self.entries.retain(|e| !keys.contains(e.stack_key()));
        self.push(items);
    }

    /// Front entry, without removing it.
    pub fn top(&self) -> Option<&T> {
        self.entries.first()
    }

    /// Remove and return the front entry.
    pub fn pop(&mut self) -> Option<T> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries.remove(0))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }
}

impl<T: StackEntry> FromIterator<T> for HistoryStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut stack = Self::new();
        stack.push(iter);
        stack
    }
}

/// Freight a Stage has used, most recent first
pub type FreightHistory = HistoryStack<FreightReference>;

/// Verification attempts of a Stage, most recent first
pub type VerificationHistory = HistoryStack<VerificationInfo>;

/// Lightweight snapshot of a Freight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightReference {
    pub name: String,
    pub origin: FreightOrigin,
    #[serde(default)]
    pub commits: Vec<GitCommit>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactReference>,
}

impl From<&Freight> for FreightReference {
    fn from(freight: &Freight) -> Self {
        Self {
            name: freight.metadata.name.clone(),
            origin: freight.origin.clone(),
            commits: freight.commits.clone(),
            images: freight.images.clone(),
            charts: freight.charts.clone(),
            artifacts: freight.artifacts.clone(),
        }
    }
}

impl StackEntry for FreightReference {
    fn stack_key(&self) -> &str {
        &self.name
    }
}

/// Phase of a verification attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationPhase {
    #[default]
    Pending,
    Running,
    Successful,
    Failed,
    Error,
    Aborted,
    Inconclusive,
}

impl VerificationPhase {
    /// Whether the attempt has reached a final outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationPhase::Pending | VerificationPhase::Running)
    }
}

impl std::fmt::Display for VerificationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VerificationPhase::Pending => "Pending",
            VerificationPhase::Running => "Running",
            VerificationPhase::Successful => "Successful",
            VerificationPhase::Failed => "Failed",
            VerificationPhase::Error => "Error",
            VerificationPhase::Aborted => "Aborted",
            VerificationPhase::Inconclusive => "Inconclusive",
        };
        write!(f, "{s}")
    }
}

/// A verification attempt of a Stage's current Freight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationInfo {
    /// Unique attempt ID, the dedupe key
    pub id: String,

    /// Who or what requested the attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub phase: VerificationPhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Name of the analysis run backing the attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_run: Option<String>,
}

impl VerificationInfo {
    pub fn new(id: impl Into<String>, phase: VerificationPhase) -> Self {
        Self {
            id: id.into(),
            phase,
            ..Default::default()
        }
    }

    pub fn has_analysis_run(&self) -> bool {
        self.analysis_run.is_some()
    }
}

impl StackEntry for VerificationInfo {
    fn stack_key(&self) -> &str {
        &self.id
    }
}
