//! Assignment plans produced by auto-selection.
//!
//! A plan is ephemeral: it is built for one run attempt, inspected by the caller,
//! and handed straight to the reservation manager. It is never persisted.

use serde::{Deserialize, Serialize};

use crate::category::ResourceCategory;
use crate::error::{ClassificationGapError, UnmetRequirementError};
use crate::resource::ResourceId;

/// Caller policy for a planning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOptions {
    /// Bypass capacity filtering (dry runs / simulation).
    #[serde(default)]
    pub infinite_consumables: bool,
    /// Allow one instance to fill several slots of the same requirement, and offer
    /// `InUse` instances once `Available` candidates are exhausted.
    #[serde(default)]
    pub allow_sharing: bool,
    /// Offer `InUse` instances without letting one instance fill several slots.
    #[serde(default)]
    pub allow_in_use: bool,
}

impl PlanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_infinite_consumables(mut self, enabled: bool) -> Self {
        self.infinite_consumables = enabled;
        self
    }

    pub fn with_allow_sharing(mut self, enabled: bool) -> Self {
        self.allow_sharing = enabled;
        self
    }

    pub fn with_allow_in_use(mut self, enabled: bool) -> Self {
        self.allow_in_use = enabled;
        self
    }
}

/// Instances selected for one requirement, best candidate first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementAssignment {
    pub requirement_name: String,
    pub category: ResourceCategory,
    pub resource_ids: Vec<ResourceId>,
    pub cardinality: usize,
    pub optional: bool,
    /// The same instance was repeated to fill `cardinality` slots.
    pub shared: bool,
}

impl RequirementAssignment {
    /// Every slot is filled, possibly by a shared instance.
    pub fn is_filled(&self) -> bool {
        self.resource_ids.len() >= self.cardinality
    }
}

/// Proposed mapping from requirements to concrete instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPlan {
    /// One entry per typed requirement, in declaration order.
    pub assignments: Vec<RequirementAssignment>,
    /// Mandatory requirements that could not be filled.
    pub unmet: Vec<String>,
    /// Requirements that are not typed resources and were not considered.
    pub skipped: Vec<String>,
    /// Requirements or instances excluded because they could not be classified.
    pub gaps: Vec<ClassificationGapError>,
    pub complete: bool,
}

impl AssignmentPlan {
    pub fn new(
        assignments: Vec<RequirementAssignment>,
        unmet: Vec<String>,
        skipped: Vec<String>,
        gaps: Vec<ClassificationGapError>,
    ) -> Self {
        let complete = unmet.is_empty();
        Self {
            assignments,
            unmet,
            skipped,
            gaps,
            complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete && self.unmet.is_empty()
    }

    pub fn assignment(&self, requirement_name: &str) -> Option<&RequirementAssignment> {
        self.assignments
            .iter()
            .find(|a| a.requirement_name == requirement_name)
    }

    pub fn resource_ids(&self, requirement_name: &str) -> Option<&[ResourceId]> {
        self.assignment(requirement_name)
            .map(|a| a.resource_ids.as_slice())
    }

    /// Each selected instance once, paired with the first requirement that claimed it.
    pub fn distinct_resources(&self) -> Vec<(&ResourceId, &str)> {
        let mut seen: Vec<(&ResourceId, &str)> = Vec::new();
        for assignment in &self.assignments {
            for id in &assignment.resource_ids {
                if !seen.iter().any(|(existing, _)| *existing == id) {
                    seen.push((id, assignment.requirement_name.as_str()));
                }
            }
        }
        seen
    }

    /// Reject a plan that leaves a mandatory requirement unmet.
    pub fn require_complete(self) -> Result<Self, UnmetRequirementError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(UnmetRequirementError {
                unmet: self.unmet.clone(),
            })
        }
    }
}
