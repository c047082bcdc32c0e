//! Freight Publisher - Stores newly discovered Freight

use crate::error::{ControllerError, Result};
use freightline_registry::{FreightStore, RegistryError};
use freightline_types::{Clock, Freight, FreightContent, Warehouse};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Publishes Freight produced by Warehouses
pub struct FreightPublisher {
    freight_store: Arc<dyn FreightStore>,
    clock: Arc<dyn Clock>,
}

impl FreightPublisher {
    pub fn new(freight_store: Arc<dyn FreightStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            freight_store,
            clock,
        }
    }

    /// Store `content` as Freight of `warehouse`, named by its identity.
    ///
    /// The origin is always the Warehouse's own. Publishing content whose
    /// identity already exists returns the stored record unchanged, so
    /// rediscovering the same artifacts never produces a second Freight.
    #[instrument(skip(self, warehouse, content), fields(
        namespace = %warehouse.namespace(),
        warehouse = %warehouse.name(),
    ))]
    pub async fn publish(
        &self,
        warehouse: &Warehouse,
        mut content: FreightContent,
    ) -> Result<Freight> {
        content.origin = warehouse.origin();
        let mut freight = content.into_freight(warehouse.namespace());

        if let Some(existing) = self
            .freight_store
            .get(freight.namespace(), freight.name())
            .await?
        {
            debug!(freight = %existing.name(), "Freight already published");
            return Ok(existing);
        }

        freight.metadata.created_at = Some(self.clock.now());
        let namespace = freight.namespace().to_string();
        let name = freight.name().to_string();

        match self.freight_store.create(freight).await {
            Ok(created) => {
                info!(
                    freight = %created.name(),
                    commits = created.commits.len(),
                    images = created.images.len(),
                    charts = created.charts.len(),
                    artifacts = created.artifacts.len(),
                    "Published Freight"
                );
                Ok(created)
            }
            // Lost a race with another publisher of the same content
            Err(RegistryError::AlreadyExists { .. }) => self
                .freight_store
                .get(&namespace, &name)
                .await?
                .ok_or(ControllerError::FreightNotFound { namespace, name }),
            Err(err) => Err(err.into()),
        }
    }
}
