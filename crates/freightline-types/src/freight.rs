//! Freight types and the per-Stage lifecycle tracker
//!
//! A Freight is an immutable, content-identified bundle of artifact
//! references. Only its [`FreightStatus`] changes after creation: the
//! reconciliation loop records which Stages currently use it, which verified
//! it, and which it has been manually approved for.

use crate::error::MetadataError;
use crate::identity::generate_freight_id;
use crate::ids::{FreightOrigin, ObjectMeta};
use crate::urls::{normalize_chart_url, normalize_git_url, normalize_image_url};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A bundle of artifacts produced by a Warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freight {
    /// Record metadata. The name is the Freight ID.
    pub metadata: ObjectMeta,

    /// Human-friendly alias, never part of the identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Warehouse that produced this Freight
    pub origin: FreightOrigin,

    /// Git commits
    #[serde(default)]
    pub commits: Vec<GitCommit>,

    /// Container images
    #[serde(default)]
    pub images: Vec<Image>,

    /// Helm charts
    #[serde(default)]
    pub charts: Vec<Chart>,

    /// Generic artifacts
    #[serde(default)]
    pub artifacts: Vec<ArtifactReference>,

    /// Lifecycle status, owned by the reconciliation loop
    #[serde(default)]
    pub status: FreightStatus,
}

/// Artifact content of a Freight before it becomes a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightContent {
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

impl FreightContent {
    pub fn new(origin: FreightOrigin) -> Self {
        Self {
            origin,
            commits: Vec::new(),
            images: Vec::new(),
            charts: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_commit(mut self, commit: GitCommit) -> Self {
        self.commits.push(commit);
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_chart(mut self, chart: Chart) -> Self {
        self.charts.push(chart);
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactReference) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Build the Freight record, named by its identity.
    pub fn into_freight(self, namespace: impl Into<String>) -> Freight {
        let mut freight = Freight {
            metadata: ObjectMeta::new(namespace, String::new()),
            alias: None,
            origin: self.origin,
            commits: self.commits,
            images: self.images,
            charts: self.charts,
            artifacts: self.artifacts,
            status: FreightStatus::default(),
        };
        freight.metadata.name = freight.id();
        freight
    }
}

/// A specific Git commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    /// Repository URL
    pub repo_url: String,

    /// Commit ID
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Tag the commit was discovered through, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<String>,
}

impl GitCommit {
    pub fn new(repo_url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A specific container image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image repository URL
    pub repo_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Annotations read from the image manifest
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Image {
    pub fn new(
        repo_url: impl Into<String>,
        tag: Option<&str>,
        digest: Option<&str>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
            annotations: BTreeMap::new(),
        }
    }
}

/// A specific Helm chart version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Chart repository URL. For OCI repositories this includes the chart name.
    pub repo_url: String,

    /// Chart name, absent for OCI repositories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub version: String,
}

impl Chart {
    pub fn new(
        repo_url: impl Into<String>,
        name: Option<&str>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            name: name.map(str::to_string),
            version: version.into(),
        }
    }
}

/// A generic artifact discovered through a named subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub artifact_type: String,
    pub subscription_name: String,
    pub version: String,

    /// Opaque discovery metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ArtifactReference {
    pub fn new(
        artifact_type: impl Into<String>,
        subscription_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            subscription_name: subscription_name.into(),
            version: version.into(),
            metadata: None,
        }
    }
}

impl Freight {
    /// Deterministic identity of this Freight's content.
    pub fn id(&self) -> String {
        generate_freight_id(self)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn is_currently_in(&self, stage: &str) -> bool {
        self.status.is_currently_in(stage)
    }

    pub fn is_verified_in(&self, stage: &str) -> bool {
        self.status.is_verified_in(stage)
    }

    pub fn is_approved_for(&self, stage: &str) -> bool {
        self.status.is_approved_for(stage)
    }

    pub fn longest_soak(&self, stage: &str, now: DateTime<Utc>) -> Duration {
        self.status.longest_soak(stage, now)
    }

    pub fn has_soaked_in(&self, stage: &str, min: Option<Duration>, now: DateTime<Utc>) -> bool {
        self.status.has_soaked_in(stage, min, now)
    }

    /// Find the commit from the given repository.
    pub fn find_commit(&self, repo_url: &str) -> Option<&GitCommit> {
        let wanted = normalize_git_url(repo_url);
        self.commits
            .iter()
            .find(|c| normalize_git_url(&c.repo_url) == wanted)
    }

    /// Find the image from the given repository.
    pub fn find_image(&self, repo_url: &str) -> Option<&Image> {
        let wanted = normalize_image_url(repo_url);
        self.images
            .iter()
            .find(|i| normalize_image_url(&i.repo_url) == wanted)
    }

    /// Find the chart from the given repository and (for classic repositories) name.
    pub fn find_chart(&self, repo_url: &str, name: Option<&str>) -> Option<&Chart> {
        let wanted = normalize_chart_url(repo_url);
        self.charts.iter().find(|c| {
            normalize_chart_url(&c.repo_url) == wanted
                && c.name.as_deref().unwrap_or_default() == name.unwrap_or_default()
        })
    }
}

/// Soak check that tolerates a missing Freight.
///
/// No Freight has soaked anywhere, so `None` is always `false`.
pub fn freight_has_soaked_in(
    freight: Option<&Freight>,
    stage: &str,
    min: Option<Duration>,
    now: DateTime<Utc>,
) -> bool {
    freight.is_some_and(|f| f.has_soaked_in(stage, min, now))
}

/// Per-Stage lifecycle records of a Freight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreightStatus {
    /// Stages currently using this Freight
    #[serde(default)]
    pub currently_in: BTreeMap<String, CurrentStage>,

    /// Stages this Freight has been verified in
    #[serde(default)]
    pub verified_in: BTreeMap<String, VerifiedStage>,

    /// Stages this Freight has been manually approved for
    #[serde(default)]
    pub approved_for: BTreeMap<String, ApprovedStage>,

    /// Opaque values written by other subsystems
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// A Stage's current use of a Freight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStage {
    /// When the Stage started using the Freight
    pub since: DateTime<Utc>,
}

/// A Stage's verification of a Freight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedStage {
    /// First successful verification
    pub verified_at: DateTime<Utc>,

    /// Longest completed period of use after verification
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::duration_serde::option"
    )]
    pub longest_completed_soak: Option<Duration>,
}

/// A manual approval of a Freight for a Stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedStage {
    pub approved_at: DateTime<Utc>,
}

impl FreightStatus {
    pub fn is_currently_in(&self, stage: &str) -> bool {
        self.currently_in.contains_key(stage)
    }

    pub fn is_verified_in(&self, stage: &str) -> bool {
        self.verified_in.contains_key(stage)
    }

    pub fn is_approved_for(&self, stage: &str) -> bool {
        self.approved_for.contains_key(stage)
    }

    /// Record that `stage` started using this Freight.
    ///
    /// A Stage already using the Freight keeps its original `since`, so
    /// re-entering never resets the soak clock.
    pub fn add_current_stage(&mut self, stage: &str, since: DateTime<Utc>) {
        self.currently_in
            .entry(stage.to_string())
            .or_insert(CurrentStage { since });
    }

    /// Record that `stage` stopped using this Freight.
    ///
    /// If the Freight is verified in the Stage, the finished period of use
    /// is folded into `longest_completed_soak` (maximum, not sum).
    pub fn remove_current_stage(&mut self, stage: &str, now: DateTime<Utc>) {
        let Some(current) = self.currently_in.remove(stage) else {
            return;
        };
        let soak = elapsed(current.since, now);
        if let Some(verified) = self.verified_in.get_mut(stage) {
            let longest = verified.longest_completed_soak.unwrap_or_default();
            verified.longest_completed_soak = Some(longest.max(soak));
        }
    }

    /// Record a successful verification. The first verification wins.
    pub fn add_verified_stage(&mut self, stage: &str, verified_at: DateTime<Utc>) {
        self.verified_in
            .entry(stage.to_string())
            .or_insert(VerifiedStage {
                verified_at,
                longest_completed_soak: None,
            });
    }

    /// Record a manual approval. The first approval wins.
    pub fn add_approved_stage(&mut self, stage: &str, approved_at: DateTime<Utc>) {
        self.approved_for
            .entry(stage.to_string())
            .or_insert(ApprovedStage { approved_at });
    }

    /// Longest soak this Freight has accrued in `stage`.
    ///
    /// Unverified Freight has no soak time. Verified Freight still in use
    /// gets credit for its ongoing period without waiting for removal.
    pub fn longest_soak(&self, stage: &str, now: DateTime<Utc>) -> Duration {
        let Some(verified) = self.verified_in.get(stage) else {
            return Duration::ZERO;
        };
        let completed = verified.longest_completed_soak.unwrap_or_default();
        let current = self
            .currently_in
            .get(stage)
            .map(|c| elapsed(c.since, now))
            .unwrap_or_default();
        completed.max(current)
    }

    /// Whether the Freight has soaked in `stage` for at least `min`.
    ///
    /// An absent or zero requirement is always met.
    pub fn has_soaked_in(&self, stage: &str, min: Option<Duration>, now: DateTime<Utc>) -> bool {
        match min {
            None => true,
            Some(min) if min.is_zero() => true,
            Some(min) => self.longest_soak(stage, now) >= min,
        }
    }

    /// Insert or replace a metadata value.
    pub fn upsert_metadata<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), MetadataError> {
        let value = serde_json::to_value(value).map_err(|source| MetadataError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.metadata.insert(key.to_string(), value);
        Ok(())
    }

    /// Read a metadata value, `None` if the key is absent.
    pub fn get_metadata<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, MetadataError> {
        let Some(value) = self.metadata.get(key) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| MetadataError::Deserialize {
                key: key.to_string(),
                source,
            })
    }
}

/// Wall-clock time between `since` and `now`; negative spans (clock skew) are zero.
fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> chrono::Duration {
        chrono::Duration::minutes(m)
    }

    fn mins(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    #[test]
    fn test_membership_checks() {
        let mut status = FreightStatus::default();
        assert!(!status.is_currently_in("qa"));
        assert!(!status.is_verified_in("qa"));
        assert!(!status.is_approved_for("qa"));

        status.add_current_stage("qa", t0());
        status.add_approved_stage("prod", t0());

        assert!(status.is_currently_in("qa"));
        assert!(!status.is_verified_in("qa"));
        assert!(status.is_approved_for("prod"));
        assert!(!status.is_approved_for("qa"));
    }

    #[test]
    fn test_add_current_stage_keeps_original_since() {
        let mut status = FreightStatus::default();
        status.add_current_stage("qa", t0());
        status.add_current_stage("qa", t0() + minutes(30));
        assert_eq!(status.currently_in["qa"].since, t0());
    }

    #[test]
    fn test_add_verified_stage_first_wins() {
        let mut status = FreightStatus::default();
        status.add_verified_stage("qa", t0());
        status.add_verified_stage("qa", t0() + minutes(1));
        assert_eq!(status.verified_in["qa"].verified_at, t0());
    }

    #[test]
    fn test_add_approved_stage_first_wins() {
        let mut status = FreightStatus::default();
        status.add_approved_stage("prod", t0());
        status.add_approved_stage("prod", t0() + minutes(1));
        assert_eq!(status.approved_for["prod"].approved_at, t0());
    }

    #[test]
    fn test_soak_accumulates_as_max() {
        let mut status = FreightStatus::default();
        status.add_current_stage("qa", t0());
        status.add_verified_stage("qa", t0());
        status.remove_current_stage("qa", t0() + minutes(5));

        assert!(!status.is_currently_in("qa"));
        assert_eq!(status.longest_soak("qa", t0() + minutes(60)), mins(5));

        // A shorter second cycle does not add up
        let start = t0() + minutes(10);
        status.add_current_stage("qa", start);
        status.remove_current_stage("qa", start + minutes(3));
        assert_eq!(status.verified_in["qa"].longest_completed_soak, Some(mins(5)));
    }

    #[test]
    fn test_remove_unverified_stage_records_nothing() {
        let mut status = FreightStatus::default();
        status.add_current_stage("qa", t0());
        status.remove_current_stage("qa", t0() + minutes(5));
        assert!(!status.is_currently_in("qa"));
        assert!(status.verified_in.is_empty());
        assert_eq!(status.longest_soak("qa", t0() + minutes(5)), Duration::ZERO);
    }

    #[test]
    fn test_remove_absent_stage_is_noop() {
        let mut status = FreightStatus::default();
        status.add_verified_stage("qa", t0());
        status.remove_current_stage("qa", t0() + minutes(5));
        assert_eq!(status.verified_in["qa"].longest_completed_soak, None);
    }

    #[test]
    fn test_longest_soak_counts_ongoing_use() {
        let mut status = FreightStatus::default();
        status.add_current_stage("qa", t0());
        status.add_verified_stage("qa", t0());
        assert_eq!(status.longest_soak("qa", t0() + minutes(7)), mins(7));
    }

    #[test]
    fn test_longest_soak_prefers_completed_when_longer() {
        let mut status = FreightStatus::default();
        status.add_current_stage("qa", t0());
        status.add_verified_stage("qa", t0());
        status.remove_current_stage("qa", t0() + minutes(20));
        status.add_current_stage("qa", t0() + minutes(30));
        assert_eq!(status.longest_soak("qa", t0() + minutes(35)), mins(20));
    }

    #[test]
    fn test_longest_soak_ignores_clock_skew() {
        let mut status = FreightStatus::default();
        status.add_current_stage("qa", t0());
        status.add_verified_stage("qa", t0());
        assert_eq!(status.longest_soak("qa", t0() - minutes(5)), Duration::ZERO);
    }

    #[test]
    fn test_has_soaked_in() {
        let mut status = FreightStatus::default();
        // No requirement is always met, even unverified
        assert!(status.has_soaked_in("qa", None, t0()));
        assert!(status.has_soaked_in("qa", Some(Duration::ZERO), t0()));
        assert!(!status.has_soaked_in("qa", Some(mins(1)), t0()));

        status.add_current_stage("qa", t0());
        status.add_verified_stage("qa", t0());
        assert!(!status.has_soaked_in("qa", Some(mins(10)), t0() + minutes(9)));
        assert!(status.has_soaked_in("qa", Some(mins(10)), t0() + minutes(10)));
    }

    #[test]
    fn test_missing_freight_has_not_soaked() {
        assert!(!freight_has_soaked_in(None, "qa", None, t0()));
    }

    #[test]
    fn test_metadata_roundtrip_and_absent_key() {
        let mut status = FreightStatus::default();
        status.upsert_metadata("ticket", &"OPS-12").unwrap();
        assert_eq!(
            status.get_metadata::<String>("ticket").unwrap(),
            Some("OPS-12".to_string())
        );
        assert_eq!(status.get_metadata::<String>("missing").unwrap(), None);

        status.upsert_metadata("ticket", &42u32).unwrap();
        assert_eq!(status.get_metadata::<u32>("ticket").unwrap(), Some(42));
    }

    #[test]
    fn test_metadata_wrong_type_fails() {
        let mut status = FreightStatus::default();
        status.upsert_metadata("count", &"not a number").unwrap();
        let err = status.get_metadata::<u64>("count").unwrap_err();
        assert!(matches!(err, MetadataError::Deserialize { ref key, .. } if key == "count"));
    }

    #[test]
    fn test_into_freight_is_named_by_id() {
        let freight = FreightContent::new(FreightOrigin::warehouse("w"))
            .with_commit(GitCommit::new("https://github.com/example/repo", "abc123"))
            .into_freight("project");
        assert_eq!(freight.name(), freight.id());
        assert_eq!(freight.namespace(), "project");
    }

    #[test]
    fn test_find_helpers_normalize() {
        let freight = FreightContent::new(FreightOrigin::warehouse("w"))
            .with_commit(GitCommit::new("https://github.com/example/repo.git", "abc123"))
            .with_image(Image::new("docker.io/library/nginx", Some("1.25"), None))
            .with_chart(Chart::new("oci://ghcr.io/example/charts/app", None, "1.0.0"))
            .with_chart(Chart::new("https://charts.example.com", Some("db"), "2.0.0"))
            .into_freight("project");

        assert_eq!(
            freight.find_commit("HTTPS://github.com/example/repo").map(|c| c.id.as_str()),
            Some("abc123")
        );
        assert!(freight.find_image("nginx").is_some());
        assert_eq!(
            freight.find_chart("ghcr.io/example/charts/app", None).map(|c| c.version.as_str()),
            Some("1.0.0")
        );
        assert!(freight.find_chart("https://charts.example.com", Some("db")).is_some());
        assert!(freight.find_chart("https://charts.example.com", Some("web")).is_none());
    }
}
