//! Reservation manager
//!
//! Turns a complete [`AssignmentPlan`] into exclusive holds, atomically per
//! attempt: either every instance in the plan is reserved for the run, or none
//! is. Exclusivity comes from per-instance mutexes taken in ascending id order
//! plus the ledger's at-most-one-active-record rule; there is no global lock, so
//! runs touching disjoint instances never wait on each other.
//!
//! Store writes are ordered so that an instance whose status is `Reserved`
//! always has an active ledger record:
//!
//! - reserve writes the ledger record, then the status
//! - release and rollback restore the status, then retire the record

mod guard;
mod locks;

pub use guard::ReservationGuard;
pub use locks::InstanceLocks;

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use labrig_kernel::{
    AssignmentPlan, Clock, InventoryStore, Reservation, ReservationConflict, ReservationLedger,
    ReservationSet, ReserveError, ResourceId, ResourceStatus, RunId, RunStateOracle, StoreError,
    SystemClock, UnmetRequirementError,
};

/// Owns every reservation-related write to the inventory and ledger.
pub struct ReservationManager {
    inventory: Arc<dyn InventoryStore>,
    ledger: Arc<dyn ReservationLedger>,
    run_state: Arc<dyn RunStateOracle>,
    locks: Arc<InstanceLocks>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ReservationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservationManager")
            .field("locks", &self.locks.len())
            .finish_non_exhaustive()
    }
}

impl ReservationManager {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        ledger: Arc<dyn ReservationLedger>,
        run_state: Arc<dyn RunStateOracle>,
    ) -> Self {
        Self {
            inventory,
            ledger,
            run_state,
            locks: Arc::new(InstanceLocks::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share a lock registry with other writers of the same inventory.
    pub fn with_locks(mut self, locks: Arc<InstanceLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> Arc<InstanceLocks> {
        Arc::clone(&self.locks)
    }

    /// Reserve every instance in `plan` for `run_id`, or nothing.
    ///
    /// An instance assigned to several slots (sharing) or requirements gets one
    /// reservation, attributed to the first requirement that selected it.
    ///
    /// # Errors
    ///
    /// - [`ReserveError::Unmet`] if the plan is incomplete; nothing is locked
    /// - [`ReserveError::Conflict`] if any instance already has an active
    ///   reservation, including one held by `run_id` itself
    /// - [`ReserveError::NotReservable`] / [`ReserveError::UnknownResource`] if the
    ///   inventory changed since planning
    /// - [`ReserveError::Store`] on a store fault
    ///
    /// Every error leaves the inventory and ledger as they were before the call.
    pub fn reserve(
        &self,
        plan: &AssignmentPlan,
        run_id: &RunId,
    ) -> Result<ReservationSet, ReserveError> {
        if !plan.is_complete() {
            return Err(UnmetRequirementError {
                unmet: plan.unmet.clone(),
            }
            .into());
        }

        let wanted = plan.distinct_resources();
        let handles = self.locks.handles(wanted.iter().map(|(id, _)| *id));
        let _guards: Vec<_> = handles.iter().map(|h| h.lock()).collect();

        let now = self.clock.now();
        let mut made: Vec<Reservation> = Vec::with_capacity(wanted.len());

        for (resource_id, requirement_name) in wanted {
            match self.hold(resource_id, requirement_name, run_id, now) {
                Ok(reservation) => made.push(reservation),
                Err(err) => {
                    warn!(
                        %run_id,
                        %resource_id,
                        error = %err,
                        rolled_back = made.len(),
                        "reservation attempt failed, rolling back"
                    );
                    self.rollback(&made);
                    return Err(err);
                }
            }
        }

        info!(%run_id, count = made.len(), "reservations created");
        Ok(ReservationSet {
            run_id: run_id.clone(),
            reservations: made,
        })
    }

    /// Like [`reserve`](Self::reserve), but the holds are released when the
    /// returned guard is dropped.
    pub fn reserve_scoped(
        &self,
        plan: &AssignmentPlan,
        run_id: &RunId,
    ) -> Result<ReservationGuard<'_>, ReserveError> {
        let set = self.reserve(plan, run_id)?;
        Ok(ReservationGuard::new(self, set))
    }

    /// Release every active reservation held by `run_id`.
    ///
    /// Restores each instance to the status it had when reserved, unless it was
    /// discarded in the meantime. Idempotent: a second call releases nothing and
    /// returns an empty list.
    pub fn release(&self, run_id: &RunId) -> Result<Vec<Reservation>, StoreError> {
        let active = self.ledger.active_for_run(run_id)?;
        if active.is_empty() {
            debug!(%run_id, "nothing to release");
            return Ok(Vec::new());
        }

        let mut released = Vec::with_capacity(active.len());
        for reservation in &active {
            if let Some(record) = self.release_one(reservation)? {
                released.push(record);
            }
        }

        info!(%run_id, count = released.len(), "reservations released");
        Ok(released)
    }

    /// Active reservations, oldest first.
    pub fn inspect(&self) -> Result<Vec<Reservation>, StoreError> {
        let mut active = self.ledger.active()?;
        active.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.resource_id.cmp(&b.resource_id))
        });
        Ok(active)
    }

    /// Force-release reservations older than `max_age` whose run the execution
    /// layer no longer reports as live.
    pub fn recover_stale(&self, max_age: Duration) -> Result<Vec<Reservation>, StoreError> {
        let now = self.clock.now();
        let mut recovered = Vec::new();

        for reservation in self.ledger.active()? {
            let age = reservation.age(now).to_std().unwrap_or_default();
            if age <= max_age {
                continue;
            }
            if self.run_state.is_run_live(&reservation.run_id) {
                debug!(
                    run_id = %reservation.run_id,
                    resource_id = %reservation.resource_id,
                    age_secs = age.as_secs(),
                    "old reservation kept, run is still live"
                );
                continue;
            }

            warn!(
                run_id = %reservation.run_id,
                resource_id = %reservation.resource_id,
                age_secs = age.as_secs(),
                "force-releasing stale reservation"
            );
            if let Some(record) = self.release_one(&reservation)? {
                recovered.push(record);
            }
        }

        if !recovered.is_empty() {
            info!(count = recovered.len(), "stale reservations recovered");
        }
        Ok(recovered)
    }

    /// Move an instance held by `run_id` from `Reserved` to `InUse`.
    ///
    /// Returns `false` when the run holds no active reservation on it or the
    /// instance is not currently `Reserved`.
    pub fn mark_in_use(
        &self,
        run_id: &RunId,
        resource_id: &ResourceId,
    ) -> Result<bool, StoreError> {
        let handle = self.locks.handle(resource_id);
        let _guard = handle.lock();

        match self.ledger.active_for_resource(resource_id)? {
            Some(active) if &active.run_id == run_id => {}
            _ => return Ok(false),
        }
        match self.inventory.get(resource_id)? {
            Some(inst) if inst.status == ResourceStatus::Reserved => {
                self.inventory.set_status(resource_id, ResourceStatus::InUse)?;
                debug!(%run_id, %resource_id, "instance in use");
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(resource_id.clone())),
        }
    }

    /// Mark an instance broken or used up. A later release leaves it discarded.
    ///
    /// Returns the previous status.
    pub fn mark_discarded(&self, resource_id: &ResourceId) -> Result<ResourceStatus, StoreError> {
        let handle = self.locks.handle(resource_id);
        let _guard = handle.lock();

        let previous = self
            .inventory
            .set_status(resource_id, ResourceStatus::Discarded)?;
        info!(%resource_id, %previous, "instance discarded");
        Ok(previous)
    }

    /// Check and write one hold. Caller holds the instance lock.
    fn hold(
        &self,
        resource_id: &ResourceId,
        requirement_name: &str,
        run_id: &RunId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReserveError> {
        if let Some(existing) = self.ledger.active_for_resource(resource_id)? {
            return Err(ReservationConflict {
                resource_id: resource_id.clone(),
                requirement_name: requirement_name.to_string(),
                held_by: existing.run_id,
            }
            .into());
        }

        let instance = self
            .inventory
            .get(resource_id)?
            .ok_or_else(|| ReserveError::UnknownResource(resource_id.clone()))?;
        if !matches!(
            instance.status,
            ResourceStatus::Available | ResourceStatus::InUse
        ) {
            return Err(ReserveError::NotReservable {
                resource_id: resource_id.clone(),
                status: instance.status,
            });
        }

        let reservation = Reservation::new(
            resource_id.clone(),
            run_id.clone(),
            requirement_name,
            instance.status,
            now,
        );
        self.ledger.insert(reservation.clone())?;

        if let Err(e) = self
            .inventory
            .set_status(resource_id, ResourceStatus::Reserved)
        {
            if let Err(cleanup) = self.ledger.remove(reservation.id) {
                warn!(
                    %resource_id,
                    error = %cleanup,
                    "failed to remove orphaned reservation record"
                );
            }
            return Err(e.into());
        }

        Ok(reservation)
    }

    /// Undo holds made by a failed attempt, newest first. Caller holds the locks.
    fn rollback(&self, made: &[Reservation]) {
        for reservation in made.iter().rev() {
            if let Err(e) = self
                .inventory
                .set_status(&reservation.resource_id, reservation.prior_status)
            {
                warn!(
                    resource_id = %reservation.resource_id,
                    error = %e,
                    "rollback: failed to restore status"
                );
            }
            if let Err(e) = self.ledger.remove(reservation.id) {
                warn!(
                    resource_id = %reservation.resource_id,
                    error = %e,
                    "rollback: failed to remove record"
                );
            }
        }
    }

    /// Release a single reservation under its instance lock.
    ///
    /// Returns `None` if it was no longer active once the lock was taken.
    fn release_one(&self, reservation: &Reservation) -> Result<Option<Reservation>, StoreError> {
        let handle = self.locks.handle(&reservation.resource_id);
        let _guard = handle.lock();

        match self.ledger.active_for_resource(&reservation.resource_id)? {
            Some(current) if current.id == reservation.id => {}
            _ => return Ok(None),
        }

        match self.inventory.get(&reservation.resource_id)? {
            Some(inst) if inst.status == ResourceStatus::Discarded => {}
            Some(_) => {
                self.inventory
                    .set_status(&reservation.resource_id, reservation.prior_status)?;
            }
            None => {
                warn!(
                    resource_id = %reservation.resource_id,
                    "released instance no longer in inventory"
                );
            }
        }

        self.ledger.mark_released(reservation.id, self.clock.now())
    }
}
