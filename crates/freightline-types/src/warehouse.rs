//! Warehouse types
//!
//! A Warehouse subscribes to artifact repositories and produces Freight.

use crate::ids::{FreightOrigin, ObjectMeta};
use crate::urls::{normalize_chart_url, normalize_git_url, normalize_image_url};
use serde::{Deserialize, Serialize};

/// Producer of Freight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub subscriptions: Vec<RepoSubscription>,
}

/// A repository a Warehouse watches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepoSubscription {
    Git { repo_url: String },
    Image { repo_url: String },
    Chart {
        repo_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Artifact { artifact_type: String, name: String },
}

impl Warehouse {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            subscriptions: Vec::new(),
        }
    }

    pub fn with_subscription(mut self, subscription: RepoSubscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Origin stamped on Freight this Warehouse produces.
    pub fn origin(&self) -> FreightOrigin {
        FreightOrigin::warehouse(self.metadata.name.clone())
    }

    pub fn subscribes_to_git(&self, repo_url: &str) -> bool {
        let wanted = normalize_git_url(repo_url);
        self.subscriptions.iter().any(|s| {
            matches!(s, RepoSubscription::Git { repo_url } if normalize_git_url(repo_url) == wanted)
        })
    }

    pub fn subscribes_to_image(&self, repo_url: &str) -> bool {
        let wanted = normalize_image_url(repo_url);
        self.subscriptions.iter().any(|s| {
            matches!(
                s,
                RepoSubscription::Image { repo_url } if normalize_image_url(repo_url) == wanted
            )
        })
    }

    pub fn subscribes_to_chart(&self, repo_url: &str, name: Option<&str>) -> bool {
        let wanted = normalize_chart_url(repo_url);
        self.subscriptions.iter().any(|s| match s {
            RepoSubscription::Chart {
                repo_url,
                name: chart_name,
            } => {
                normalize_chart_url(repo_url) == wanted
                    && chart_name.as_deref().unwrap_or_default() == name.unwrap_or_default()
            }
            _ => false,
        })
    }
}
