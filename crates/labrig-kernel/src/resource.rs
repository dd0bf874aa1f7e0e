//! Physical or simulated resource instances.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::ResourceCategory;

/// Inventory identity of a resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle status of an instance as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Free to be planned and reserved.
    #[default]
    Available,
    /// Held by an active reservation.
    Reserved,
    /// Actively being operated on by a run.
    InUse,
    /// Broken, depleted or removed; never matched again.
    Discarded,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Reserved => write!(f, "reserved"),
            Self::InUse => write!(f, "in_use"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}

/// A physical or simulated unit in the inventory.
///
/// Created and updated by the inventory collaborator. The engine reads
/// `category`, `capacity_max` and `location`, and writes `status` and
/// `capacity_remaining` only through the reservation manager and the consumable
/// tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInstance {
    pub id: ResourceId,
    /// Class identifier reported by the hardware/labware library, e.g. `"Cor_96_wellplate_360ul_Fb"`.
    #[serde(default)]
    pub type_identifier: String,
    /// Canonical category; `None` when the taxonomy could not classify the type.
    #[serde(default)]
    pub category: Option<ResourceCategory>,
    #[serde(default)]
    pub status: ResourceStatus,
    /// Remaining consumable capacity; `None` for non-consumables.
    #[serde(default)]
    pub capacity_remaining: Option<f64>,
    #[serde(default)]
    pub capacity_max: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_simulated: bool,
}

impl ResourceInstance {
    /// Create an available, non-consumable instance of a classified type.
    pub fn new(
        id: impl Into<ResourceId>,
        type_identifier: impl Into<String>,
        category: ResourceCategory,
    ) -> Self {
        Self {
            id: id.into(),
            type_identifier: type_identifier.into(),
            category: Some(category),
            status: ResourceStatus::Available,
            capacity_remaining: None,
            capacity_max: None,
            location: None,
            is_simulated: false,
        }
    }

    /// Create an instance whose category is still to be resolved by the taxonomy.
    pub fn unclassified(id: impl Into<ResourceId>, type_identifier: impl Into<String>) -> Self {
        Self {
            category: None,
            ..Self::new(id, type_identifier, ResourceCategory::Plate)
        }
    }

    /// Track consumable capacity, starting full.
    pub fn with_capacity(mut self, capacity_max: f64) -> Self {
        self.capacity_max = Some(capacity_max);
        self.capacity_remaining = Some(capacity_max);
        self
    }

    /// Override the remaining capacity of a partially used consumable.
    pub fn with_remaining(mut self, remaining: f64) -> Self {
        self.capacity_remaining = Some(remaining);
        if self.capacity_max.is_none() {
            self.capacity_max = Some(remaining);
        }
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn simulated(mut self) -> Self {
        self.is_simulated = true;
        self
    }

    /// Whether capacity is tracked for this instance.
    pub fn is_consumable(&self) -> bool {
        self.capacity_remaining.is_some()
    }

    /// Tracked capacity has run out.
    pub fn is_depleted(&self) -> bool {
        matches!(self.capacity_remaining, Some(r) if r <= 0.0)
    }
}
