//! In-memory inventory and reservation ledger.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use labrig_kernel::{
    InventoryStore, Reservation, ReservationLedger, ReservationStatus, ResourceId,
    ResourceInstance, ResourceStatus, RunId, StoreError,
};

/// In-memory inventory
///
/// Plays the role of the external inventory collaborator: `insert`/`remove` are
/// its CRUD surface, while the engine only goes through [`InventoryStore`].
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    instances: RwLock<HashMap<ResourceId, ResourceInstance>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instances(instances: impl IntoIterator<Item = ResourceInstance>) -> Self {
        Self {
            instances: RwLock::new(
                instances
                    .into_iter()
                    .map(|inst| (inst.id.clone(), inst))
                    .collect(),
            ),
        }
    }

    /// Create shared in-memory inventory
    pub fn shared(instances: impl IntoIterator<Item = ResourceInstance>) -> Arc<Self> {
        Arc::new(Self::from_instances(instances))
    }

    /// Add or replace an instance.
    pub fn insert(&self, instance: ResourceInstance) {
        self.instances.write().insert(instance.id.clone(), instance);
    }

    pub fn remove(&self, id: &ResourceId) -> Option<ResourceInstance> {
        self.instances.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

impl InventoryStore for InMemoryInventory {
    fn snapshot(&self) -> Result<Vec<ResourceInstance>, StoreError> {
        let mut all: Vec<ResourceInstance> = self.instances.read().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    fn get(&self, id: &ResourceId) -> Result<Option<ResourceInstance>, StoreError> {
        Ok(self.instances.read().get(id).cloned())
    }

    fn set_status(
        &self,
        id: &ResourceId,
        status: ResourceStatus,
    ) -> Result<ResourceStatus, StoreError> {
        let mut instances = self.instances.write();
        let instance = instances
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(std::mem::replace(&mut instance.status, status))
    }

    fn set_capacity_remaining(
        &self,
        id: &ResourceId,
        remaining: Option<f64>,
    ) -> Result<(), StoreError> {
        let mut instances = self.instances.write();
        let instance = instances
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        instance.capacity_remaining = remaining;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    /// Arena of records; rolled-back slots become `None`.
    records: Vec<Option<Reservation>>,
    by_id: HashMap<Uuid, usize>,
    active_by_resource: HashMap<ResourceId, usize>,
}

impl LedgerInner {
    fn record(&self, idx: usize) -> Option<&Reservation> {
        self.records.get(idx).and_then(Option::as_ref)
    }
}

/// In-memory reservation ledger
///
/// Records are kept arena-style: released reservations stay in the arena as
/// history, and an index maps each resource to its single active record.
#[derive(Debug, Default)]
pub struct InMemoryReservationLedger {
    inner: RwLock<LedgerInner>,
}

impl InMemoryReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Every record ever written and not rolled back, active or released.
    pub fn history(&self) -> Vec<Reservation> {
        self.inner.read().records.iter().flatten().cloned().collect()
    }
}

impl ReservationLedger for InMemoryReservationLedger {
    fn insert(&self, reservation: Reservation) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if reservation.is_active()
            && inner
                .active_by_resource
                .contains_key(&reservation.resource_id)
        {
            return Err(StoreError::ActiveReservationExists(
                reservation.resource_id.clone(),
            ));
        }
        let idx = inner.records.len();
        inner.by_id.insert(reservation.id, idx);
        if reservation.is_active() {
            inner
                .active_by_resource
                .insert(reservation.resource_id.clone(), idx);
        }
        inner.records.push(Some(reservation));
        Ok(())
    }

    fn remove(&self, reservation_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let Some(idx) = inner.by_id.remove(&reservation_id) else {
            return Ok(());
        };
        if let Some(record) = inner.records[idx].take() {
            if inner.active_by_resource.get(&record.resource_id) == Some(&idx) {
                inner.active_by_resource.remove(&record.resource_id);
            }
        }
        Ok(())
    }

    fn mark_released(
        &self,
        reservation_id: Uuid,
        released_at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError> {
        let mut inner = self.inner.write();
        let Some(&idx) = inner.by_id.get(&reservation_id) else {
            return Ok(None);
        };
        let Some(record) = inner.records[idx].as_mut() else {
            return Ok(None);
        };
        if record.status == ReservationStatus::Released {
            return Ok(None);
        }
        record.status = ReservationStatus::Released;
        record.released_at = Some(released_at);
        let released = record.clone();
        inner.active_by_resource.remove(&released.resource_id);
        Ok(Some(released))
    }

    fn active_for_resource(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Option<Reservation>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .active_by_resource
            .get(resource_id)
            .and_then(|&idx| inner.record(idx))
            .cloned())
    }

    fn active_for_run(&self, run_id: &RunId) -> Result<Vec<Reservation>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .active_by_resource
            .values()
            .filter_map(|&idx| inner.record(idx))
            .filter(|r| &r.run_id == run_id)
            .cloned()
            .collect())
    }

    fn active(&self) -> Result<Vec<Reservation>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .active_by_resource
            .values()
            .filter_map(|&idx| inner.record(idx))
            .cloned()
            .collect())
    }
}
