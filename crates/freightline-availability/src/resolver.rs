//! Freight Resolver - Eligibility queries over a Warehouse's Freight

use crate::error::{AvailabilityError, Result};
use crate::options::{AvailabilityStrategy, ListFreightOptions};
use freightline_registry::{FreightQuery, FreightStore, WarehouseStore};
use freightline_types::{Clock, Freight, Stage, Warehouse};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves which Freight a Stage may be promoted to
pub struct FreightResolver {
    freight_store: Arc<dyn FreightStore>,
    warehouse_store: Arc<dyn WarehouseStore>,
    clock: Arc<dyn Clock>,
}

impl FreightResolver {
    pub fn new(
        freight_store: Arc<dyn FreightStore>,
        warehouse_store: Arc<dyn WarehouseStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            freight_store,
            warehouse_store,
            clock,
        }
    }

    /// List Freight from `warehouse` that satisfies `options`.
    ///
    /// Without options, or with neither `approved_for` nor `verified_in`,
    /// every Freight from the Warehouse is returned. `required_soak_time` is
    /// measured only in `verified_in` Stages and is ignored without them. The
    /// result is sorted by name and holds each Freight once.
    #[instrument(skip(self, warehouse, options), fields(
        namespace = %warehouse.namespace(),
        warehouse = %warehouse.name(),
    ))]
    pub async fn list_freight_from_warehouse(
        &self,
        warehouse: &Warehouse,
        options: Option<&ListFreightOptions>,
    ) -> Result<Vec<Freight>> {
        let default_options = ListFreightOptions::default();
        let options = options.unwrap_or(&default_options);
        let strategy = AvailabilityStrategy::parse(options.availability_strategy.as_deref())?;

        let mut selected: BTreeMap<String, Freight> = BTreeMap::new();
        for query in build_queries(warehouse, options, strategy) {
            let freight = self
                .freight_store
                .list(warehouse.namespace(), &query)
                .await
                .map_err(|source| AvailabilityError::ListFreight {
                    namespace: warehouse.namespace().to_string(),
                    warehouse: warehouse.name().to_string(),
                    source,
                })?;
            debug!(
                approved_for = ?query.approved_for,
                verified_in = ?query.verified_in,
                currently_in = ?query.currently_in,
                matched = freight.len(),
                "Freight predicate evaluated"
            );
            for f in freight {
                selected.entry(f.metadata.name.clone()).or_insert(f);
            }
        }
        let selected: Vec<Freight> = selected.into_values().collect();

        if options.verified_in.is_empty() {
            return Ok(selected);
        }

        let now = self.clock.now();
        let available: Vec<Freight> = selected
            .into_iter()
            .filter(|freight| {
                if let Some(stage) = options.approved_for.as_deref() {
                    if freight.is_approved_for(stage) {
                        return true;
                    }
                }
                let mut soaked = options
                    .verified_in
                    .iter()
                    .map(|stage| freight.has_soaked_in(stage, options.required_soak_time, now));
                match strategy {
                    AvailabilityStrategy::All => soaked.all(|ok| ok),
                    AvailabilityStrategy::OneOf => soaked.any(|ok| ok),
                }
            })
            .collect();

        debug!(
            strategy = %strategy,
            required_soak_time = ?options.required_soak_time,
            available = available.len(),
            "Soak filter applied"
        );
        Ok(available)
    }

    /// List Freight that may be promoted into `stage`, across all of its
    /// Freight requests.
    #[instrument(skip(self, stage), fields(
        namespace = %stage.namespace(),
        stage = %stage.name(),
    ))]
    pub async fn list_available_freight(&self, stage: &Stage) -> Result<Vec<Freight>> {
        let mut available: BTreeMap<String, Freight> = BTreeMap::new();

        for request in &stage.spec.requested_freight {
            let warehouse = self
                .warehouse_store
                .get(stage.namespace(), &request.origin.name)
                .await
                .map_err(|source| AvailabilityError::GetWarehouse {
                    namespace: stage.namespace().to_string(),
                    warehouse: request.origin.name.clone(),
                    source,
                })?
                .ok_or_else(|| AvailabilityError::WarehouseNotFound {
                    namespace: stage.namespace().to_string(),
                    name: request.origin.name.clone(),
                })?;

            let freight = if request.sources.direct {
                self.list_freight_from_warehouse(&warehouse, None).await?
            } else {
                let options = ListFreightOptions {
                    approved_for: Some(stage.name().to_string()),
                    verified_in: request.sources.stages.clone(),
                    availability_strategy: request.sources.availability_strategy.clone(),
                    required_soak_time: request.sources.required_soak_time,
                    currently_in: None,
                };
                self.list_freight_from_warehouse(&warehouse, Some(&options))
                    .await?
            };

            for f in freight {
                available.entry(f.metadata.name.clone()).or_insert(f);
            }
        }

        Ok(available.into_values().collect())
    }
}

/// Independent predicates whose union is the candidate set.
fn build_queries(
    warehouse: &Warehouse,
    options: &ListFreightOptions,
    strategy: AvailabilityStrategy,
) -> Vec<FreightQuery> {
    let base = || FreightQuery::for_origin(warehouse.origin());

    if options.approved_for.is_none() && options.verified_in.is_empty() {
        return vec![base().currently_in(options.currently_in.clone())];
    }

    let mut queries = Vec::new();
    if let Some(stage) = &options.approved_for {
        queries.push(base().approved_for(stage.clone()));
    }
    if !options.verified_in.is_empty() {
        match strategy {
            AvailabilityStrategy::All => queries.push(
                base()
                    .verified_in_all(options.verified_in.iter().cloned())
                    .currently_in(options.currently_in.clone()),
            ),
            AvailabilityStrategy::OneOf => {
                queries.extend(options.verified_in.iter().map(|stage| {
                    base()
                        .verified_in(stage.clone())
                        .currently_in(options.currently_in.clone())
                }))
            }
        }
    }
    queries
}
