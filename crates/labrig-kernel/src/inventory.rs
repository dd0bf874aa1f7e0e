//! Inventory and taxonomy collaborator contracts.

use crate::category::ResourceCategory;
use crate::error::StoreError;
use crate::resource::{ResourceId, ResourceInstance, ResourceStatus};

/// Category source of truth provided by the class-discovery subsystem.
///
/// The engine treats the answer as ground truth and performs no inference of its
/// own; `None` means the type is unknown to the taxonomy.
pub trait CategorySource: Send + Sync {
    fn category_of(&self, type_identifier: &str) -> Option<ResourceCategory>;
}

impl<F> CategorySource for F
where
    F: Fn(&str) -> Option<ResourceCategory> + Send + Sync,
{
    fn category_of(&self, type_identifier: &str) -> Option<ResourceCategory> {
        self(type_identifier)
    }
}

/// Read access to inventory records plus the write path for the two fields the
/// engine owns.
///
/// Writes are issued by the reservation manager and the consumable tracker while
/// they hold the per-instance lock, so each call only needs to be atomic on its own.
pub trait InventoryStore: Send + Sync {
    /// All instances, in no particular order.
    fn snapshot(&self) -> Result<Vec<ResourceInstance>, StoreError>;

    fn get(&self, id: &ResourceId) -> Result<Option<ResourceInstance>, StoreError>;

    /// Set the status and return the previous one.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the instance does not exist.
    fn set_status(
        &self,
        id: &ResourceId,
        status: ResourceStatus,
    ) -> Result<ResourceStatus, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the instance does not exist.
    fn set_capacity_remaining(
        &self,
        id: &ResourceId,
        remaining: Option<f64>,
    ) -> Result<(), StoreError>;
}
