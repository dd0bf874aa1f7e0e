//! Auto-selection: turns a protocol's requirements and an inventory snapshot into
//! an [`AssignmentPlan`].
//!
//! Requirements are processed in declaration order. Each one takes its
//! best-ranked eligible candidates out of a shared pool, so a later requirement
//! never receives an instance already given to an earlier one. A shortfall never
//! aborts planning; it is reported in the plan instead.

use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info};

use labrig_kernel::{
    AssetRequirement, AssignmentPlan, PlanOptions, RequirementAssignment, ResourceId,
    ResourceInstance, ResourceStatus,
};

use crate::matcher::eligible;
use crate::taxonomy::{
    RequirementClass, Taxonomy, classify_instances_with, resolve_requirement_with,
};

/// Greedy allocator over a single inventory snapshot.
#[derive(Debug, Clone, Default)]
pub struct AutoSelector {
    taxonomy: Option<Taxonomy>,
}

impl AutoSelector {
    /// A selector that only understands explicitly categorised requirements and
    /// instances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `type_hint`s and unclassified instances through `taxonomy`.
    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }

    pub fn taxonomy(&self) -> Option<&Taxonomy> {
        self.taxonomy.as_ref()
    }

    pub fn plan(
        &self,
        requirements: &[AssetRequirement],
        inventory: &[ResourceInstance],
        options: &PlanOptions,
    ) -> AssignmentPlan {
        let (pool, mut gaps) = classify_instances_with(self.taxonomy.as_ref(), inventory.to_vec());

        let mut taken: HashSet<ResourceId> = HashSet::new();
        let mut assignments = Vec::new();
        let mut unmet = Vec::new();
        let mut skipped = Vec::new();

        for req in requirements {
            let category = match resolve_requirement_with(self.taxonomy.as_ref(), req) {
                RequirementClass::Typed(category) => category,
                RequirementClass::Untyped => {
                    debug!(requirement = %req.name, "not a typed resource, skipped");
                    skipped.push(req.name.clone());
                    continue;
                }
                RequirementClass::Gap(gap) => {
                    gaps.push(gap);
                    if !req.optional {
                        unmet.push(req.name.clone());
                    }
                    continue;
                }
            };

            let mut resolved = req.clone();
            resolved.required_category = Some(category);

            let mut candidates: Vec<&ResourceInstance> = eligible(&resolved, &pool, options)
                .into_iter()
                .filter(|inst| !taken.contains(&inst.id))
                .filter(|inst| offerable(inst.status, options))
                .collect();
            candidates.sort_by(|a, b| rank(a, b));

            let mut picks: Vec<ResourceId> = candidates
                .iter()
                .take(req.cardinality)
                .map(|inst| inst.id.clone())
                .collect();
            let mut shared = false;

            if picks.len() < req.cardinality && !req.optional {
                if options.allow_sharing && !picks.is_empty() {
                    let best = picks[0].clone();
                    picks.resize(req.cardinality, best);
                    shared = true;
                } else {
                    unmet.push(req.name.clone());
                }
            }

            debug!(
                requirement = %req.name,
                %category,
                candidates = candidates.len(),
                selected = ?picks,
                shared,
                "requirement processed"
            );

            taken.extend(picks.iter().cloned());
            assignments.push(RequirementAssignment {
                requirement_name: req.name.clone(),
                category,
                resource_ids: picks,
                cardinality: req.cardinality,
                optional: req.optional,
                shared,
            });
        }

        let plan = AssignmentPlan::new(assignments, unmet, skipped, gaps);
        info!(
            requirements = requirements.len(),
            assigned = plan.assignments.len(),
            unmet = plan.unmet.len(),
            gaps = plan.gaps.len(),
            complete = plan.is_complete(),
            "assignment plan built"
        );
        plan
    }
}

/// `Reserved` instances are never offered; `InUse` only when the caller shares.
fn offerable(status: ResourceStatus, options: &PlanOptions) -> bool {
    match status {
        ResourceStatus::Available => true,
        ResourceStatus::InUse => options.allow_sharing || options.allow_in_use,
        ResourceStatus::Reserved | ResourceStatus::Discarded => false,
    }
}

fn status_rank(status: ResourceStatus) -> u8 {
    match status {
        ResourceStatus::Available => 0,
        _ => 1,
    }
}

/// Available first, then least remaining capacity (untracked last), then id.
fn rank(a: &ResourceInstance, b: &ResourceInstance) -> Ordering {
    status_rank(a.status)
        .cmp(&status_rank(b.status))
        .then_with(|| match (a.capacity_remaining, b.capacity_remaining) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}
