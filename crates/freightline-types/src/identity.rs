//! Freight identity hashing
//!
//! A Freight ID is the SHA-1 of its origin and its sorted artifact "hash
//! parts". Sorting makes the ID independent of the order artifacts were
//! listed in; every identifying field of every artifact is part of its hash
//! part, so any change yields a new ID.

use crate::freight::{ArtifactReference, Chart, Freight, GitCommit, Image};
use crate::urls::{normalize_chart_url, normalize_git_url};
use sha1::{Digest, Sha1};

/// Compute the deterministic ID of a Freight from its origin and artifacts.
pub fn generate_freight_id(freight: &Freight) -> String {
    let canonical = canonical_form(freight);
    let mut hasher = Sha1::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// `origin:part|part|...` with parts sorted lexicographically.
fn canonical_form(freight: &Freight) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(
        freight.commits.len()
            + freight.images.len()
            + freight.charts.len()
            + freight.artifacts.len(),
    );
    parts.extend(freight.commits.iter().map(commit_part));
    parts.extend(freight.images.iter().map(image_part));
    parts.extend(freight.charts.iter().map(chart_part));
    parts.extend(freight.artifacts.iter().map(artifact_part));
    parts.sort();

    format!("{}:{}", freight.origin, parts.join("|"))
}

/// A tag is folded in because a known commit can later acquire a new tag,
/// which must surface as new Freight.
fn commit_part(commit: &GitCommit) -> String {
    let repo = normalize_git_url(&commit.repo_url);
    match commit.tag.as_deref().filter(|t| !t.is_empty()) {
        Some(tag) => format!("{repo}:{tag}:{}", commit.id),
        None => format!("{repo}:{}", commit.id),
    }
}

/// Both tag and digest: a mutable tag can move to a new digest and a digest
/// can be re-tagged.
fn image_part(image: &Image) -> String {
    format!(
        "{}:{}@{}",
        image.repo_url,
        image.tag.as_deref().unwrap_or_default(),
        image.digest.as_deref().unwrap_or_default()
    )
}

fn chart_part(chart: &Chart) -> String {
    let repo = normalize_chart_url(&chart.repo_url);
    let location = match chart.name.as_deref().map(|n| n.trim_matches('/')) {
        Some(name) if !name.is_empty() => format!("{}/{}", repo.trim_end_matches('/'), name),
        _ => repo,
    };
    format!("{location}:{}", chart.version)
}

fn artifact_part(artifact: &ArtifactReference) -> String {
    format!(
        "{}:{}:{}",
        artifact.artifact_type, artifact.subscription_name, artifact.version
    )
}
