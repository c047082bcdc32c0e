//! Warehouse store trait

use crate::error::Result;
use async_trait::async_trait;
use freightline_types::Warehouse;

/// Store for Warehouse records
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    /// Create a Warehouse. Fails if the name is taken in the namespace.
    async fn create(&self, warehouse: Warehouse) -> Result<Warehouse>;

    /// Get a Warehouse by name
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Warehouse>>;

    /// List Warehouses in a namespace, sorted by name
    async fn list(&self, namespace: &str) -> Result<Vec<Warehouse>>;
}
