//! End-to-end promotion pipeline over in-memory stores

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use freightline_controller::{ControllerConfig, ControllerError, FreightPublisher, StageReconciler};
use freightline_registry::{
    ConflictAware, FreightQuery, FreightStore, InMemoryFreightStore, InMemoryStageStore,
    InMemoryWarehouseStore, RegistryError, RetryPolicy, StageStore, WarehouseStore,
};
use freightline_types::{
    Freight, FreightContent, FreightOrigin, FreightRequest, FreightStatus, GitCommit, Image,
    ManualClock, RepoSubscription, Stage, VerificationInfo, VerificationPhase, Warehouse,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn release(tag: &str, commit: &str) -> FreightContent {
    FreightContent::new(FreightOrigin::warehouse("app"))
        .with_commit(GitCommit::new("https://github.com/example/app", commit))
        .with_image(Image::new("ghcr.io/example/app", Some(tag), None))
}

/// Freight store where another writer lands just before the next few status writes
struct ContendedFreightStore {
    inner: InMemoryFreightStore,
    pending_conflicts: AtomicU32,
}

impl ContendedFreightStore {
    fn new() -> Self {
        Self {
            inner: InMemoryFreightStore::new(),
            pending_conflicts: AtomicU32::new(0),
        }
    }

    fn contend(&self, writes: u32) {
        self.pending_conflicts.store(writes, Ordering::SeqCst);
    }
}

#[async_trait]
impl FreightStore for ContendedFreightStore {
    async fn create(&self, freight: Freight) -> freightline_registry::Result<Freight> {
        self.inner.create(freight).await
    }

    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> freightline_registry::Result<Option<Freight>> {
        self.inner.get(namespace, name).await
    }

    async fn list(
        &self,
        namespace: &str,
        query: &FreightQuery,
    ) -> freightline_registry::Result<Vec<Freight>> {
        self.inner.list(namespace, query).await
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: FreightStatus,
        expected_version: u64,
    ) -> freightline_registry::Result<Freight> {
        let contended = self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if contended {
            if let Some(current) = self.inner.get(namespace, name).await? {
                let mut competing = current.status.clone();
                competing.add_approved_stage("hotfix", t0());
                self.inner
                    .update_status(namespace, name, competing, current.metadata.resource_version)
                    .await?;
            }
        }
        self.inner
            .update_status(namespace, name, status, expected_version)
            .await
    }
}

struct Pipeline {
    freight: Arc<ContendedFreightStore>,
    clock: Arc<ManualClock>,
    publisher: FreightPublisher,
    reconciler: StageReconciler,
    warehouse: Warehouse,
}

impl Pipeline {
    /// `qa` takes Freight straight from the Warehouse, `uat` once it soaked
    /// in `qa` for ten minutes.
    async fn new(retry: RetryPolicy) -> Self {
        let freight = Arc::new(ContendedFreightStore::new());
        let stages = Arc::new(InMemoryStageStore::new());
        let warehouses = Arc::new(InMemoryWarehouseStore::new());
        let clock = Arc::new(ManualClock::new(t0()));

        let warehouse = warehouses
            .create(
                Warehouse::new("ns", "app")
                    .with_subscription(RepoSubscription::Git {
                        repo_url: "https://github.com/example/app".into(),
                    })
                    .with_subscription(RepoSubscription::Image {
                        repo_url: "ghcr.io/example/app".into(),
                    }),
            )
            .await
            .unwrap();
        stages
            .create(Stage::new("ns", "qa").with_request(FreightRequest::direct(warehouse.origin())))
            .await
            .unwrap();
        stages
            .create(
                Stage::new("ns", "uat").with_request(
                    FreightRequest::from_stages(warehouse.origin(), ["qa"])
                        .with_required_soak_time(Duration::from_secs(10 * 60)),
                ),
            )
            .await
            .unwrap();

        Self {
            publisher: FreightPublisher::new(freight.clone(), clock.clone()),
            reconciler: StageReconciler::new(
                stages,
                freight.clone(),
                warehouses,
                clock.clone(),
                retry,
            ),
            freight,
            clock,
            warehouse,
        }
    }

    fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(chrono::Duration::minutes(minutes));
    }

    async fn promotable(&self, stage: &str) -> Vec<String> {
        self.reconciler
            .promotable_freight("ns", stage)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.metadata.name)
            .collect()
    }
}

#[tokio::test]
async fn test_freight_soaks_before_reaching_downstream_stage() {
    let pipeline = Pipeline::new(RetryPolicy::new(3, Duration::ZERO)).await;
    let first = pipeline
        .publisher
        .publish(&pipeline.warehouse, release("1.0.0", "aaa111"))
        .await
        .unwrap();
    assert_eq!(pipeline.promotable("qa").await, vec![first.name().to_string()]);
    assert!(pipeline.promotable("uat").await.is_empty());

    pipeline
        .reconciler
        .freight_promoted("ns", "qa", first.name())
        .await
        .unwrap();
    pipeline
        .reconciler
        .verification_recorded(
            "ns",
            "qa",
            VerificationInfo::new("v1", VerificationPhase::Successful),
        )
        .await
        .unwrap();

    // Verified, but not soaked long enough yet
    pipeline.advance_minutes(5);
    assert!(pipeline.promotable("uat").await.is_empty());

    pipeline.advance_minutes(5);
    assert_eq!(pipeline.promotable("uat").await, vec![first.name().to_string()]);

    // Replacing it in qa completes a 12 minute soak, which still qualifies
    pipeline.advance_minutes(2);
    let second = pipeline
        .publisher
        .publish(&pipeline.warehouse, release("1.1.0", "bbb222"))
        .await
        .unwrap();
    pipeline
        .reconciler
        .freight_promoted("ns", "qa", second.name())
        .await
        .unwrap();

    let first = pipeline.freight.get("ns", first.name()).await.unwrap().unwrap();
    assert!(!first.is_currently_in("qa"));
    assert_eq!(
        first.status.verified_in["qa"].longest_completed_soak,
        Some(Duration::from_secs(12 * 60))
    );
    assert_eq!(pipeline.promotable("uat").await, vec![first.name().to_string()]);
}

#[tokio::test]
async fn test_approval_bypasses_verification_and_soak() {
    let pipeline = Pipeline::new(RetryPolicy::new(3, Duration::ZERO)).await;
    let hotfix = pipeline
        .publisher
        .publish(&pipeline.warehouse, release("1.0.1", "ccc333"))
        .await
        .unwrap();
    assert!(pipeline.promotable("uat").await.is_empty());

    pipeline
        .reconciler
        .freight_approved("ns", hotfix.name(), "uat")
        .await
        .unwrap();
    assert_eq!(pipeline.promotable("uat").await, vec![hotfix.name().to_string()]);
}

#[tokio::test]
async fn test_republishing_same_artifacts_is_idempotent() {
    let pipeline = Pipeline::new(RetryPolicy::new(3, Duration::ZERO)).await;
    let first = pipeline
        .publisher
        .publish(&pipeline.warehouse, release("1.0.0", "aaa111"))
        .await
        .unwrap();
    pipeline
        .reconciler
        .freight_approved("ns", first.name(), "uat")
        .await
        .unwrap();

    let again = pipeline
        .publisher
        .publish(&pipeline.warehouse, release("1.0.0", "aaa111"))
        .await
        .unwrap();
    assert_eq!(again.name(), first.name());
    assert!(again.is_approved_for("uat"));
}

#[tokio::test(start_paused = true)]
async fn test_conflicting_writes_are_retried_without_losing_updates() {
    let retry = ControllerConfig::default().retry.policy();
    let pipeline = Pipeline::new(retry).await;
    let freight = pipeline
        .publisher
        .publish(&pipeline.warehouse, release("1.0.0", "aaa111"))
        .await
        .unwrap();

    pipeline.freight.contend(2);
    let updated = pipeline
        .reconciler
        .freight_approved("ns", freight.name(), "uat")
        .await
        .unwrap();

    assert!(updated.is_approved_for("uat"));
    assert!(updated.is_approved_for("hotfix"));
    // Two competing writes plus our own
    assert_eq!(updated.metadata.resource_version, 4);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_conflicts_give_up() {
    let pipeline = Pipeline::new(RetryPolicy::new(3, Duration::from_millis(10))).await;
    let freight = pipeline
        .publisher
        .publish(&pipeline.warehouse, release("1.0.0", "aaa111"))
        .await
        .unwrap();

    pipeline.freight.contend(10);
    let err = pipeline
        .reconciler
        .freight_approved("ns", freight.name(), "uat")
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(matches!(
        err,
        ControllerError::Registry(RegistryError::VersionConflict { .. })
    ));
}
