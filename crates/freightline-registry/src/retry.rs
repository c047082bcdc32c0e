//! Retry-on-conflict for read-mutate-write cycles
//!
//! The engine never locks. Callers read a record, apply an engine mutator to
//! the in-memory copy, and write it back naming the version they read. When
//! another writer won the race, the whole cycle is run again from a fresh
//! read.

use crate::error::RegistryError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Errors that can signal a lost optimistic-concurrency race
pub trait ConflictAware {
    fn is_conflict(&self) -> bool;
}

impl ConflictAware for RegistryError {
    fn is_conflict(&self) -> bool {
        RegistryError::is_conflict(self)
    }
}

/// How often and how patiently to retry a conflicting write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Run `op` until it succeeds, fails with a non-conflict error, or the
/// policy's attempts are used up.
pub async fn retry_on_conflict<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ConflictAware + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(err) if err.is_conflict() && attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "Write conflict, retrying from a fresh read"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> RegistryError {
        RegistryError::VersionConflict {
            namespace: "ns".into(),
            name: "f".into(),
            current: 2,
            expected: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, RegistryError> =
            retry_on_conflict(&RetryPolicy::default(), move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(conflict())
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let result: Result<(), RegistryError> = retry_on_conflict(&policy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;
        assert!(result.unwrap_err().is_conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), RegistryError> =
            retry_on_conflict(&RetryPolicy::default(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(RegistryError::Storage("disk full".into()))
            })
            .await;
        assert!(matches!(result, Err(RegistryError::Storage(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let _: Result<(), RegistryError> = retry_on_conflict(&policy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
