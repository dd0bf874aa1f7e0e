//! Consumable capacity tracking.
//!
//! Capacity writes go through the same per-instance locks as reservations, so a
//! decrement never interleaves with another decrement or a release of the same
//! instance. Remaining capacity never goes negative: an overdraw is rejected
//! before anything is written.

use dashmap::DashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use labrig_kernel::{
    ConsumableDepletedError, ConsumeError, InventoryStore, ReservationLedger, ResourceId,
    ResourceInstance, ResourceStatus, RunId, StoreError,
};

use crate::reservation::InstanceLocks;

pub struct ConsumableTracker {
    inventory: Arc<dyn InventoryStore>,
    ledger: Arc<dyn ReservationLedger>,
    locks: Arc<InstanceLocks>,
    global_infinite: AtomicBool,
    infinite_runs: DashSet<RunId>,
}

impl fmt::Debug for ConsumableTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumableTracker")
            .field("global_infinite", &self.global_infinite.load(Ordering::Relaxed))
            .field("infinite_runs", &self.infinite_runs.len())
            .finish_non_exhaustive()
    }
}

impl ConsumableTracker {
    pub fn new(inventory: Arc<dyn InventoryStore>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self {
            inventory,
            ledger,
            locks: Arc::new(InstanceLocks::new()),
            global_infinite: AtomicBool::new(false),
            infinite_runs: DashSet::new(),
        }
    }

    pub fn with_locks(mut self, locks: Arc<InstanceLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Treat every consumable as unlimited (simulation hosts).
    pub fn with_infinite_consumables(self, enabled: bool) -> Self {
        self.global_infinite.store(enabled, Ordering::Relaxed);
        self
    }

    /// Enable or disable unlimited consumables for instances held by `run_id`.
    pub fn set_infinite_mode(&self, run_id: &RunId, enabled: bool) {
        if enabled {
            self.infinite_runs.insert(run_id.clone());
        } else {
            self.infinite_runs.remove(run_id);
        }
        debug!(%run_id, enabled, "infinite consumable mode");
    }

    pub fn is_infinite_run(&self, run_id: &RunId) -> bool {
        self.global_infinite.load(Ordering::Relaxed) || self.infinite_runs.contains(run_id)
    }

    /// Take `amount` from an instance's remaining capacity.
    ///
    /// Returns the new remaining capacity, or `None` when capacity is unlimited
    /// for this call (infinite mode) or not tracked for the instance.
    ///
    /// # Errors
    ///
    /// - [`ConsumeError::InvalidAmount`] for negative or non-finite amounts
    /// - [`ConsumeError::Depleted`] if `amount` exceeds what remains; nothing is written
    /// - [`ConsumeError::UnknownResource`] if the instance is not in the inventory
    pub fn consume(
        &self,
        resource_id: &ResourceId,
        amount: f64,
    ) -> Result<Option<f64>, ConsumeError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ConsumeError::InvalidAmount {
                resource_id: resource_id.clone(),
                amount,
            });
        }

        let handle = self.locks.handle(resource_id);
        let _guard = handle.lock();

        let instance = self.instance(resource_id)?;
        if self.infinite_for(resource_id)? {
            debug!(%resource_id, amount, "consumed in infinite mode");
            return Ok(None);
        }
        let Some(remaining) = instance.capacity_remaining else {
            debug!(%resource_id, amount, "capacity not tracked");
            return Ok(None);
        };

        if amount > remaining {
            warn!(%resource_id, amount, remaining, "consumable depleted");
            return Err(ConsumableDepletedError {
                resource_id: resource_id.clone(),
                requested: amount,
                remaining,
            }
            .into());
        }

        let left = remaining - amount;
        self.inventory
            .set_capacity_remaining(resource_id, Some(left))?;
        debug!(%resource_id, amount, remaining = left, "consumed");
        Ok(Some(left))
    }

    /// Current remaining capacity; `None` for untracked instances.
    pub fn remaining(&self, resource_id: &ResourceId) -> Result<Option<f64>, ConsumeError> {
        Ok(self.instance(resource_id)?.capacity_remaining)
    }

    /// `remaining <= threshold`. Untracked instances are never low.
    pub fn is_low_stock(
        &self,
        resource_id: &ResourceId,
        threshold: f64,
    ) -> Result<bool, ConsumeError> {
        Ok(self
            .remaining(resource_id)?
            .is_some_and(|remaining| remaining <= threshold))
    }

    /// Restore remaining capacity to `capacity_max`.
    pub fn refill(&self, resource_id: &ResourceId) -> Result<Option<f64>, ConsumeError> {
        let handle = self.locks.handle(resource_id);
        let _guard = handle.lock();

        let instance = self.instance(resource_id)?;
        let Some(max) = instance.capacity_max else {
            return Ok(None);
        };
        self.inventory.set_capacity_remaining(resource_id, Some(max))?;
        info!(%resource_id, capacity = max, "consumable refilled");
        Ok(Some(max))
    }

    /// Consumables at or below `threshold`, emptiest first. Discarded instances
    /// are left out.
    pub fn low_stock(&self, threshold: f64) -> Result<Vec<ResourceInstance>, StoreError> {
        let mut low: Vec<ResourceInstance> = self
            .inventory
            .snapshot()?
            .into_iter()
            .filter(|inst| inst.status != ResourceStatus::Discarded)
            .filter(|inst| inst.capacity_remaining.is_some_and(|r| r <= threshold))
            .collect();
        low.sort_by(|a, b| {
            let ra = a.capacity_remaining.unwrap_or_default();
            let rb = b.capacity_remaining.unwrap_or_default();
            ra.total_cmp(&rb).then_with(|| a.id.cmp(&b.id))
        });
        Ok(low)
    }

    fn instance(&self, resource_id: &ResourceId) -> Result<ResourceInstance, ConsumeError> {
        self.inventory
            .get(resource_id)?
            .ok_or_else(|| ConsumeError::UnknownResource(resource_id.clone()))
    }

    fn infinite_for(&self, resource_id: &ResourceId) -> Result<bool, StoreError> {
        if self.global_infinite.load(Ordering::Relaxed) {
            return Ok(true);
        }
        if self.infinite_runs.is_empty() {
            return Ok(false);
        }
        Ok(self
            .ledger
            .active_for_resource(resource_id)?
            .is_some_and(|held| self.infinite_runs.contains(&held.run_id)))
    }
}
