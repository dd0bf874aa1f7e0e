use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

use labrig_kernel::ResourceId;

/// Registry of per-instance mutexes.
///
/// Every write to an instance's status, capacity or reservation records happens
/// under that instance's mutex. Multi-instance callers take the handles from
/// [`InstanceLocks::handles`], which are sorted by id, and lock them in order.
#[derive(Debug, Default)]
pub struct InstanceLocks {
    locks: DashMap<ResourceId, Arc<Mutex<()>>>,
}

impl InstanceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, id: &ResourceId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Deduplicated handles in ascending id order.
    pub fn handles<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ResourceId>,
    ) -> Vec<Arc<Mutex<()>>> {
        ids.into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|id| self.handle(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
