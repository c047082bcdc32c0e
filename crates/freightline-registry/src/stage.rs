//! Stage store trait

use crate::error::Result;
use async_trait::async_trait;
use freightline_types::{Stage, StageStatus};

/// Store for Stage records
#[async_trait]
pub trait StageStore: Send + Sync {
    /// Create a Stage. Fails if the name is taken in the namespace.
    async fn create(&self, stage: Stage) -> Result<Stage>;

    /// Get a Stage by name
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Stage>>;

    /// List Stages in a namespace, sorted by name
    async fn list(&self, namespace: &str) -> Result<Vec<Stage>>;

    /// Replace a Stage's status if its resource version is still `expected_version`
    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: StageStatus,
        expected_version: u64,
    ) -> Result<Stage>;
}
