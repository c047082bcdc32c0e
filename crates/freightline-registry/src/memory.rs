//! In-memory implementations of store traits
//!
//! These are suitable for development and testing. Writes bump
//! `metadata.resource_version` so optimistic concurrency behaves as it would
//! against a persistent backend.

use crate::error::{RegistryError, Result};
use crate::freight::FreightStore;
use crate::query::FreightQuery;
use crate::stage::StageStore;
use crate::warehouse::WarehouseStore;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use freightline_types::{Freight, FreightStatus, ObjectMeta, Stage, StageStatus, Warehouse};

type ObjectKey = (String, String);

fn key(namespace: &str, name: &str) -> ObjectKey {
    (namespace.to_string(), name.to_string())
}

fn check_version(meta: &ObjectMeta, expected: u64) -> Result<()> {
    if meta.resource_version != expected {
        return Err(RegistryError::VersionConflict {
            namespace: meta.namespace.clone(),
            name: meta.name.clone(),
            current: meta.resource_version,
            expected,
        });
    }
    Ok(())
}

/// In-memory Freight store
pub struct InMemoryFreightStore {
    freight: DashMap<ObjectKey, Freight>,
}

impl InMemoryFreightStore {
    pub fn new() -> Self {
        Self {
            freight: DashMap::new(),
        }
    }
}

impl Default for InMemoryFreightStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FreightStore for InMemoryFreightStore {
    async fn create(&self, mut freight: Freight) -> Result<Freight> {
        match self.freight.entry(key(freight.namespace(), freight.name())) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists {
                kind: "Freight",
                namespace: freight.metadata.namespace,
                name: freight.metadata.name,
            }),
            Entry::Vacant(slot) => {
                freight.metadata.resource_version = 1;
                slot.insert(freight.clone());
                Ok(freight)
            }
        }
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Freight>> {
        Ok(self.freight.get(&key(namespace, name)).map(|f| f.clone()))
    }

    async fn list(&self, namespace: &str, query: &FreightQuery) -> Result<Vec<Freight>> {
        let mut result: Vec<Freight> = self
            .freight
            .iter()
            .filter(|f| f.namespace() == namespace && query.matches(f.value()))
            .map(|f| f.value().clone())
            .collect();
        result.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(result)
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: FreightStatus,
        expected_version: u64,
    ) -> Result<Freight> {
        let mut freight = self.freight.get_mut(&key(namespace, name)).ok_or_else(|| {
            RegistryError::FreightNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
        })?;
        check_version(&freight.metadata, expected_version)?;
        freight.status = status;
        freight.metadata.resource_version += 1;
        Ok(freight.clone())
    }
}

/// In-memory Stage store
pub struct InMemoryStageStore {
    stages: DashMap<ObjectKey, Stage>,
}

impl InMemoryStageStore {
    pub fn new() -> Self {
        Self {
            stages: DashMap::new(),
        }
    }
}

impl Default for InMemoryStageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageStore for InMemoryStageStore {
    async fn create(&self, mut stage: Stage) -> Result<Stage> {
        match self.stages.entry(key(stage.namespace(), stage.name())) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists {
                kind: "Stage",
                namespace: stage.metadata.namespace,
                name: stage.metadata.name,
            }),
            Entry::Vacant(slot) => {
                stage.metadata.resource_version = 1;
                slot.insert(stage.clone());
                Ok(stage)
            }
        }
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Stage>> {
        Ok(self.stages.get(&key(namespace, name)).map(|s| s.clone()))
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Stage>> {
        let mut result: Vec<Stage> = self
            .stages
            .iter()
            .filter(|s| s.namespace() == namespace)
            .map(|s| s.value().clone())
            .collect();
        result.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(result)
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: StageStatus,
        expected_version: u64,
    ) -> Result<Stage> {
        let mut stage = self.stages.get_mut(&key(namespace, name)).ok_or_else(|| {
            RegistryError::StageNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
        })?;
        check_version(&stage.metadata, expected_version)?;
        stage.status = status;
        stage.metadata.resource_version += 1;
        Ok(stage.clone())
    }
}

/// In-memory Warehouse store
pub struct InMemoryWarehouseStore {
    warehouses: DashMap<ObjectKey, Warehouse>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self {
            warehouses: DashMap::new(),
        }
    }
}

impl Default for InMemoryWarehouseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn create(&self, mut warehouse: Warehouse) -> Result<Warehouse> {
        match self.warehouses.entry(key(warehouse.namespace(), warehouse.name())) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists {
                kind: "Warehouse",
                namespace: warehouse.metadata.namespace,
                name: warehouse.metadata.name,
            }),
            Entry::Vacant(slot) => {
                warehouse.metadata.resource_version = 1;
                slot.insert(warehouse.clone());
                Ok(warehouse)
            }
        }
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Warehouse>> {
        Ok(self.warehouses.get(&key(namespace, name)).map(|w| w.clone()))
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Warehouse>> {
        let mut result: Vec<Warehouse> = self
            .warehouses
            .iter()
            .filter(|w| w.namespace() == namespace)
            .map(|w| w.value().clone())
            .collect();
        result.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(result)
    }
}
