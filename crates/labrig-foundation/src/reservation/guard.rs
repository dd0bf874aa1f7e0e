use tracing::error;

use labrig_kernel::{Reservation, ReservationSet, RunId, StoreError};

use super::ReservationManager;

/// Holds a run's reservations and releases them when dropped.
///
/// Covers every in-process exit path, including unwinding. It cannot cover a
/// crash; that is what `recover_stale` is for.
#[must_use = "dropping the guard releases the reservations immediately"]
#[derive(Debug)]
pub struct ReservationGuard<'a> {
    manager: &'a ReservationManager,
    set: ReservationSet,
    released: bool,
}

impl<'a> ReservationGuard<'a> {
    pub(super) fn new(manager: &'a ReservationManager, set: ReservationSet) -> Self {
        Self {
            manager,
            set,
            released: false,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.set.run_id
    }

    pub fn reservations(&self) -> &ReservationSet {
        &self.set
    }

    /// Release now and report store faults, which `Drop` can only log.
    pub fn release(mut self) -> Result<Vec<Reservation>, StoreError> {
        self.released = true;
        self.manager.release(&self.set.run_id)
    }
}

impl Drop for ReservationGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.manager.release(&self.set.run_id) {
            error!(run_id = %self.set.run_id, error = %e, "failed to release reservations on drop");
        }
    }
}
