//! Requirement matching.
//!
//! Pure filtering of an inventory snapshot down to the instances that could fill a
//! requirement. Ranking and allocation belong to the selector.

use labrig_kernel::{AssetRequirement, PlanOptions, ResourceInstance, ResourceStatus};

/// Instances that satisfy `req`, in inventory order.
///
/// - the instance category must equal `required_category` exactly; a requirement
///   without one yields nothing
/// - `Discarded` instances never match
/// - unless `options.infinite_consumables` is set, tracked consumables must have
///   `capacity_remaining >= min_capacity` and must not be depleted; untracked
///   capacity always passes
/// - location constraints are applied last; an instance without a location fails
///   any constraint
pub fn eligible<'a>(
    req: &AssetRequirement,
    inventory: &'a [ResourceInstance],
    options: &PlanOptions,
) -> Vec<&'a ResourceInstance> {
    let Some(category) = req.required_category else {
        return Vec::new();
    };

    inventory
        .iter()
        .filter(|inst| inst.category == Some(category))
        .filter(|inst| inst.status != ResourceStatus::Discarded)
        .filter(|inst| options.infinite_consumables || has_capacity(inst, req.min_capacity))
        .filter(|inst| {
            req.location_constraints
                .as_ref()
                .is_none_or(|c| c.admits(inst.location.as_deref()))
        })
        .collect()
}

fn has_capacity(inst: &ResourceInstance, min_capacity: Option<f64>) -> bool {
    match (inst.capacity_remaining, min_capacity) {
        (None, _) => true,
        (Some(remaining), Some(min)) => remaining >= min && remaining > 0.0,
        (Some(remaining), None) => remaining > 0.0,
    }
}
