//! Freight store trait

use crate::error::Result;
use crate::query::FreightQuery;
use async_trait::async_trait;
use freightline_types::{Freight, FreightStatus};

/// Store for Freight records
#[async_trait]
pub trait FreightStore: Send + Sync {
    /// Create a Freight. Fails if the name is taken in the namespace.
    async fn create(&self, freight: Freight) -> Result<Freight>;

    /// Get a Freight by name
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Freight>>;

    /// List Freight in a namespace matching the query, sorted by name
    async fn list(&self, namespace: &str, query: &FreightQuery) -> Result<Vec<Freight>>;

    /// Replace a Freight's status if its resource version is still `expected_version`
    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: FreightStatus,
        expected_version: u64,
    ) -> Result<Freight>;

    /// Check if a Freight exists
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        Ok(self.get(namespace, name).await?.is_some())
    }
}
