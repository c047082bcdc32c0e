//! Stage Reconciler - Lifecycle bookkeeping for promotions and verifications
//!
//! Each operation reads the affected records, applies the engine's mutators
//! to an in-memory copy and writes it back conditionally. A lost race re-runs
//! the cycle from a fresh read according to the configured [`RetryPolicy`].

use crate::error::{ControllerError, Result};
use chrono::{DateTime, Utc};
use freightline_availability::FreightResolver;
use freightline_registry::{
    retry_on_conflict, FreightStore, RetryPolicy, StageStore, WarehouseStore,
};
use freightline_types::{
    Clock, Freight, FreightReference, FreightStatus, Stage, StageStatus, VerificationInfo,
    VerificationPhase,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Keeps Freight and Stage records in step with the promotion pipeline
pub struct StageReconciler {
    stage_store: Arc<dyn StageStore>,
    freight_store: Arc<dyn FreightStore>,
    resolver: FreightResolver,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl StageReconciler {
    pub fn new(
        stage_store: Arc<dyn StageStore>,
        freight_store: Arc<dyn FreightStore>,
        warehouse_store: Arc<dyn WarehouseStore>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        let resolver = FreightResolver::new(freight_store.clone(), warehouse_store, clock.clone());
        Self {
            stage_store,
            freight_store,
            resolver,
            clock,
            retry,
        }
    }

    /// Record that `stage` now uses `freight`.
    ///
    /// The previously current Freight leaves the Stage, which completes its
    /// soak period there. The new Freight is pushed onto the Stage's Freight
    /// history even when it was already current, so re-promotions show up.
    #[instrument(skip(self))]
    pub async fn freight_promoted(
        &self,
        namespace: &str,
        stage: &str,
        freight: &str,
    ) -> Result<Stage> {
        let promoted = self.load_freight(namespace, freight).await?;
        let previous = self
            .load_stage(namespace, stage)
            .await?
            .status
            .current_freight()
            .map(|f| f.name.clone());

        if let Some(previous) = previous.as_deref().filter(|p| *p != freight) {
            match self
                .update_freight_status(namespace, previous, |status, now| {
                    status.remove_current_stage(stage, now)
                })
                .await
            {
                Ok(_) => {}
                Err(ControllerError::FreightNotFound { .. }) => {
                    warn!(previous, "Previous Freight no longer exists");
                }
                Err(err) => return Err(err),
            }
        }
        // Keeps an existing `since`, so re-promoting never resets the soak clock
        self.update_freight_status(namespace, freight, |status, now| {
            status.add_current_stage(stage, now)
        })
        .await?;

        let reference = FreightReference::from(&promoted);
        let updated = self
            .update_stage_status(namespace, stage, |status, _| {
                status.freight_history.push([reference.clone()])
            })
            .await?;

        info!(previous = ?previous, "Freight promoted");
        Ok(updated)
    }

    /// Record a verification attempt of the Stage's current Freight.
    ///
    /// Attempts are keyed by ID, so reporting progress of a known attempt
    /// replaces it and moves it to the front of the history. A successful
    /// attempt marks the current Freight as verified in the Stage.
    #[instrument(skip(self, info), fields(verification = %info.id, phase = %info.phase))]
    pub async fn verification_recorded(
        &self,
        namespace: &str,
        stage: &str,
        mut info: VerificationInfo,
    ) -> Result<Stage> {
        if info.phase.is_terminal() && info.finished_at.is_none() {
            info.finished_at = Some(self.clock.now());
        }

        let updated = self
            .update_stage_status(namespace, stage, |status, _| {
                status.verification_history.update_or_push([info.clone()])
            })
            .await?;

        if info.phase == VerificationPhase::Successful {
            match updated.status.current_freight().map(|f| f.name.clone()) {
                Some(current) => {
                    self.update_freight_status(namespace, &current, |status, now| {
                        status.add_verified_stage(stage, now)
                    })
                    .await?;
                    info!(freight = %current, "Freight verified");
                }
                None => warn!("Verification succeeded but the Stage has no current Freight"),
            }
        }

        Ok(updated)
    }

    /// Start a new verification attempt, recorded as running.
    #[instrument(skip(self))]
    pub async fn start_verification(
        &self,
        namespace: &str,
        stage: &str,
        actor: Option<&str>,
    ) -> Result<VerificationInfo> {
        let mut info =
            VerificationInfo::new(Uuid::new_v4().to_string(), VerificationPhase::Running);
        info.actor = actor.map(str::to_string);
        info.started_at = Some(self.clock.now());

        self.verification_recorded(namespace, stage, info.clone())
            .await?;
        Ok(info)
    }

    /// Manually approve `freight` for `stage`.
    #[instrument(skip(self))]
    pub async fn freight_approved(
        &self,
        namespace: &str,
        freight: &str,
        stage: &str,
    ) -> Result<Freight> {
        self.load_stage(namespace, stage).await?;
        let updated = self
            .update_freight_status(namespace, freight, |status, now| {
                status.add_approved_stage(stage, now)
            })
            .await?;
        info!("Freight approved");
        Ok(updated)
    }

    /// Record that `stage` stopped using `freight`.
    #[instrument(skip(self))]
    pub async fn freight_released(
        &self,
        namespace: &str,
        stage: &str,
        freight: &str,
    ) -> Result<Freight> {
        self.update_freight_status(namespace, freight, |status, now| {
            status.remove_current_stage(stage, now)
        })
        .await
    }

    /// Freight that may be promoted into `stage` now.
    #[instrument(skip(self))]
    pub async fn promotable_freight(&self, namespace: &str, stage: &str) -> Result<Vec<Freight>> {
        let stage = self.load_stage(namespace, stage).await?;
        Ok(self.resolver.list_available_freight(&stage).await?)
    }

    async fn load_freight(&self, namespace: &str, name: &str) -> Result<Freight> {
        self.freight_store
            .get(namespace, name)
            .await?
            .ok_or_else(|| ControllerError::FreightNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn load_stage(&self, namespace: &str, name: &str) -> Result<Stage> {
        self.stage_store
            .get(namespace, name)
            .await?
            .ok_or_else(|| ControllerError::StageNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn update_freight_status<F>(
        &self,
        namespace: &str,
        name: &str,
        mutate: F,
    ) -> Result<Freight>
    where
        F: Fn(&mut FreightStatus, DateTime<Utc>),
    {
        let mutate = &mutate;
        retry_on_conflict(&self.retry, move || async move {
            let freight = self.load_freight(namespace, name).await?;
            let mut status = freight.status.clone();
            mutate(&mut status, self.clock.now());
            let updated = self
                .freight_store
                .update_status(namespace, name, status, freight.metadata.resource_version)
                .await?;
            Ok::<_, ControllerError>(updated)
        })
        .await
    }

    async fn update_stage_status<F>(&self, namespace: &str, name: &str, mutate: F) -> Result<Stage>
    where
        F: Fn(&mut StageStatus, DateTime<Utc>),
    {
        let mutate = &mutate;
        retry_on_conflict(&self.retry, move || async move {
            let stage = self.load_stage(namespace, name).await?;
            let mut status = stage.status.clone();
            mutate(&mut status, self.clock.now());
            let updated = self
                .stage_store
                .update_status(namespace, name, status, stage.metadata.resource_version)
                .await?;
            Ok::<_, ControllerError>(updated)
        })
        .await
    }
}
