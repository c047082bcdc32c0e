//! URL normalization for artifact repositories
//!
//! Equivalent locations of the same Git repository, image repository or chart
//! repository must compare equal, both for Freight identity and for matching
//! Warehouse subscriptions. Normalization never fails: input that cannot be
//! understood is returned unchanged.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// `[user@]host.xz:path/to/repo.git`
static SCP_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[\w.~-]+@)?[\w.-]+):(?:/)?(.+)$").expect("scp syntax pattern is valid")
});

/// Hosts that all address Docker Hub.
const DOCKER_HUB_ALIASES: &[&str] = &[
    "docker.io/",
    "index.docker.io/",
    "registry-1.docker.io/",
    "registry.hub.docker.com/",
];

const OCI_PREFIX: &str = "oci://";

/// Normalize a Git repository URL.
///
/// Lowercases, strips credentials (all user info for HTTP/S, the password for
/// SSH), and trims trailing slashes and a `.git` suffix. SCP-style addresses
/// are normalized through their `ssh://` equivalent and returned without the
/// scheme.
pub fn normalize_git_url(repo_url: &str) -> String {
    let lowered = repo_url.trim().to_lowercase();

    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        return match Url::parse(&lowered) {
            Ok(mut url) => {
                // Both setters only fail for URLs that cannot carry user info
                let _ = url.set_username("");
                let _ = url.set_password(None);
                trim_repo_path(&mut url);
                url.to_string()
            }
            Err(_) => repo_url.to_string(),
        };
    }

    if lowered.starts_with("ssh://") {
        return match Url::parse(&lowered) {
            Ok(mut url) => {
                let _ = url.set_password(None);
                trim_repo_path(&mut url);
                url.to_string()
            }
            Err(_) => repo_url.to_string(),
        };
    }

    let Some(captures) = SCP_SYNTAX.captures(&lowered) else {
        return repo_url.to_string();
    };
    let candidate = format!("ssh://{}/{}", &captures[1], &captures[2]);
    match Url::parse(&candidate) {
        Ok(mut url) => {
            let _ = url.set_password(None);
            trim_repo_path(&mut url);
            url.to_string().replacen("ssh://", "", 1)
        }
        Err(_) => repo_url.to_string(),
    }
}

fn trim_repo_path(url: &mut Url) {
    let trimmed = url.path().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string();
    url.set_path(&trimmed);
}

/// Normalize a container image repository URL.
///
/// Docker Hub aliases collapse to the familiar short form, so
/// `docker.io/library/nginx` and `nginx` compare equal.
pub fn normalize_image_url(repo_url: &str) -> String {
    let mut normalized = repo_url.trim().trim_end_matches('/').to_lowercase();

    for alias in DOCKER_HUB_ALIASES {
        if let Some(rest) = normalized.strip_prefix(alias) {
            normalized = rest.to_string();
            break;
        }
    }

    match normalized.strip_prefix("library/") {
        Some(official) if !official.is_empty() => official.to_string(),
        _ => normalized,
    }
}

/// Normalize a Helm chart repository URL.
///
/// The `oci://` prefix is dropped (case-insensitively) so that the same OCI
/// repository addressed with and without a scheme compares equal.
pub fn normalize_chart_url(repo_url: &str) -> String {
    let lowered = repo_url.trim().to_lowercase();
    let without_scheme = lowered.strip_prefix(OCI_PREFIX).unwrap_or(&lowered);
    without_scheme.trim_end_matches('/').to_string()
}
