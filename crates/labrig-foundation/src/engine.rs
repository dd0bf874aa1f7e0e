//! Engine facade
//!
//! [`ResourceEngine`] wires the selector, reservation manager and consumable
//! tracker over one set of injected stores, sharing a single per-instance lock
//! registry between the two writers.
//!
//! # Example
//!
//! ```rust,ignore
//! use labrig_foundation::{EngineConfig, InMemoryInventory, ResourceEngine};
//!
//! let engine = ResourceEngine::builder()
//!     .with_config(EngineConfig::default())
//!     .with_inventory(InMemoryInventory::shared(instances))
//!     .with_run_state(Arc::new(|run: &RunId| scheduler.is_live(run)))
//!     .build()?;
//!
//! let (plan, holds) = engine.plan_and_reserve(&requirements, &run_id, engine.default_options())?;
//! // ... execute the protocol, calling engine.consume(..) per operation ...
//! engine.release(&run_id)?;
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use labrig_kernel::{
    AssetRequirement, AssignmentPlan, CategorySource, Clock, ConsumeError, EngineError,
    EngineResult, InventoryStore, PlanOptions, Reservation, ReservationLedger, ReservationSet,
    ReserveError, ResourceId, ResourceInstance, ResourceStatus, RunId, RunStateOracle, StoreError,
    UnmetRequirementError,
};

use crate::config::EngineConfig;
use crate::consumable::ConsumableTracker;
use crate::reservation::{InstanceLocks, ReservationGuard, ReservationManager};
use crate::selector::AutoSelector;
use crate::store::InMemoryReservationLedger;
use crate::taxonomy::Taxonomy;

/// Builder for [`ResourceEngine`]
///
/// Only the inventory is required. Without a ledger an in-memory one is used;
/// without a run-state oracle every run is treated as live, so stale recovery
/// never force-releases anything.
#[derive(Default)]
pub struct ResourceEngineBuilder {
    config: EngineConfig,
    inventory: Option<Arc<dyn InventoryStore>>,
    ledger: Option<Arc<dyn ReservationLedger>>,
    run_state: Option<Arc<dyn RunStateOracle>>,
    categories: Option<Arc<dyn CategorySource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ResourceEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_inventory(mut self, inventory: Arc<dyn InventoryStore>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn ReservationLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_run_state(mut self, run_state: Arc<dyn RunStateOracle>) -> Self {
        self.run_state = Some(run_state);
        self
    }

    /// Resolve type hints and unclassified instances through `categories`.
    pub fn with_categories(mut self, categories: Arc<dyn CategorySource>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> EngineResult<ResourceEngine> {
        let inventory = self.inventory.ok_or_else(|| {
            error_stack::Report::new(EngineError::Internal(
                "an inventory store is required".to_string(),
            ))
        })?;
        let ledger = self
            .ledger
            .unwrap_or_else(|| InMemoryReservationLedger::shared() as Arc<dyn ReservationLedger>);
        let run_state = self.run_state.unwrap_or_else(|| {
            warn!("no run-state oracle configured, stale reservations will not be recovered");
            Arc::new(|_: &RunId| true) as Arc<dyn RunStateOracle>
        });

        let locks = Arc::new(InstanceLocks::new());

        let mut reservations =
            ReservationManager::new(Arc::clone(&inventory), Arc::clone(&ledger), run_state)
                .with_locks(Arc::clone(&locks));
        if let Some(clock) = self.clock {
            reservations = reservations.with_clock(clock);
        }

        let consumables = ConsumableTracker::new(Arc::clone(&inventory), ledger)
            .with_locks(locks)
            .with_infinite_consumables(self.config.infinite_consumables);

        let mut selector = AutoSelector::new();
        if let Some(categories) = self.categories {
            selector = selector.with_taxonomy(Taxonomy::new(categories));
        }

        Ok(ResourceEngine {
            config: self.config,
            inventory,
            selector,
            reservations,
            consumables,
        })
    }
}

/// Planning, reservation and consumable tracking over shared stores.
pub struct ResourceEngine {
    config: EngineConfig,
    inventory: Arc<dyn InventoryStore>,
    selector: AutoSelector,
    reservations: ReservationManager,
    consumables: ConsumableTracker,
}

impl fmt::Debug for ResourceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceEngine")
            .field("config", &self.config)
            .field("selector", &self.selector)
            .field("reservations", &self.reservations)
            .field("consumables", &self.consumables)
            .finish_non_exhaustive()
    }
}

impl ResourceEngine {
    pub fn builder() -> ResourceEngineBuilder {
        ResourceEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Planning options from the engine configuration.
    pub fn default_options(&self) -> PlanOptions {
        self.config.plan_options()
    }

    pub fn selector(&self) -> &AutoSelector {
        &self.selector
    }

    pub fn reservations(&self) -> &ReservationManager {
        &self.reservations
    }

    pub fn consumables(&self) -> &ConsumableTracker {
        &self.consumables
    }

    /// Plan against a fresh inventory snapshot.
    pub fn plan(
        &self,
        requirements: &[AssetRequirement],
        options: PlanOptions,
    ) -> Result<AssignmentPlan, StoreError> {
        let snapshot = self.inventory.snapshot()?;
        Ok(self.plan_with_snapshot(requirements, &snapshot, options))
    }

    pub fn plan_with_snapshot(
        &self,
        requirements: &[AssetRequirement],
        inventory: &[ResourceInstance],
        options: PlanOptions,
    ) -> AssignmentPlan {
        self.selector.plan(requirements, inventory, &options)
    }

    pub fn reserve(
        &self,
        plan: &AssignmentPlan,
        run_id: &RunId,
    ) -> Result<ReservationSet, ReserveError> {
        self.reservations.reserve(plan, run_id)
    }

    pub fn reserve_scoped(
        &self,
        plan: &AssignmentPlan,
        run_id: &RunId,
    ) -> Result<ReservationGuard<'_>, ReserveError> {
        self.reservations.reserve_scoped(plan, run_id)
    }

    /// Snapshot, plan, require a complete plan, reserve.
    ///
    /// A [`ReserveError::Conflict`] is returned unchanged; callers retry the
    /// whole call, which re-plans against a fresh snapshot. With
    /// `options.infinite_consumables` the run is put into infinite consumable
    /// mode until it is released.
    pub fn plan_and_reserve(
        &self,
        requirements: &[AssetRequirement],
        run_id: &RunId,
        options: PlanOptions,
    ) -> Result<(AssignmentPlan, ReservationSet), ReserveError> {
        let plan = self.plan(requirements, options)?;
        if !plan.is_complete() {
            debug!(%run_id, unmet = ?plan.unmet, "plan incomplete, nothing reserved");
            return Err(UnmetRequirementError {
                unmet: plan.unmet.clone(),
            }
            .into());
        }

        let set = self.reservations.reserve(&plan, run_id)?;
        if options.infinite_consumables {
            self.consumables.set_infinite_mode(run_id, true);
        }
        Ok((plan, set))
    }

    /// Release the run's reservations and clear its infinite consumable mode.
    pub fn release(&self, run_id: &RunId) -> Result<Vec<Reservation>, StoreError> {
        let released = self.reservations.release(run_id)?;
        self.consumables.set_infinite_mode(run_id, false);
        Ok(released)
    }

    pub fn consume(
        &self,
        resource_id: &ResourceId,
        amount: f64,
    ) -> Result<Option<f64>, ConsumeError> {
        self.consumables.consume(resource_id, amount)
    }

    pub fn remaining(&self, resource_id: &ResourceId) -> Result<Option<f64>, ConsumeError> {
        self.consumables.remaining(resource_id)
    }

    pub fn is_low_stock(
        &self,
        resource_id: &ResourceId,
        threshold: f64,
    ) -> Result<bool, ConsumeError> {
        self.consumables.is_low_stock(resource_id, threshold)
    }

    pub fn refill(&self, resource_id: &ResourceId) -> Result<Option<f64>, ConsumeError> {
        self.consumables.refill(resource_id)
    }

    pub fn mark_in_use(
        &self,
        run_id: &RunId,
        resource_id: &ResourceId,
    ) -> Result<bool, StoreError> {
        self.reservations.mark_in_use(run_id, resource_id)
    }

    pub fn mark_discarded(&self, resource_id: &ResourceId) -> Result<ResourceStatus, StoreError> {
        self.reservations.mark_discarded(resource_id)
    }

    pub fn inspect(&self) -> Result<Vec<Reservation>, StoreError> {
        self.reservations.inspect()
    }

    /// Force-release stale holds of dead runs and clear those runs' infinite mode.
    pub fn recover_stale(&self, max_age: Duration) -> Result<Vec<Reservation>, StoreError> {
        let recovered = self.reservations.recover_stale(max_age)?;
        let runs: BTreeSet<&RunId> = recovered.iter().map(|r| &r.run_id).collect();
        for run_id in runs {
            self.consumables.set_infinite_mode(run_id, false);
        }
        Ok(recovered)
    }

    /// Consumables at or below `threshold`, or the configured threshold.
    pub fn low_stock_report(
        &self,
        threshold: Option<f64>,
    ) -> Result<Vec<ResourceInstance>, StoreError> {
        self.consumables
            .low_stock(threshold.unwrap_or(self.config.low_stock_threshold))
    }
}
