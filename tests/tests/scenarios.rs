//! End-to-end planning and reservation scenarios.

use labrig_kernel::{
    AssetRequirement, PlanOptions, ReserveError, ResourceCategory, ResourceId, ResourceStatus,
    RunId,
};
use labrig_testing::fixtures::{liquid_handler, plate, tip_rack};
use labrig_testing::{TestBed, assert_status};

#[test]
fn min_capacity_picks_the_rack_with_enough_tips() {
    let bed = TestBed::new([tip_rack("T1", 10.0), tip_rack("T2", 96.0)]);
    let requirements =
        [AssetRequirement::new("tips", ResourceCategory::TipRack).with_min_capacity(50.0)];

    let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();

    assert!(plan.is_complete());
    assert_eq!(plan.resource_ids("tips").unwrap(), [ResourceId::from("T2")]);
}

#[test]
fn single_plate_cannot_fill_two_slots_without_sharing() {
    let bed = TestBed::new([plate("P1")]);
    let requirements =
        [AssetRequirement::new("plates", ResourceCategory::Plate).with_cardinality(2)];

    let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
    assert!(!plan.is_complete());
    assert!(plan.unmet.contains(&"plates".to_string()));

    let err = bed
        .engine
        .plan_and_reserve(&requirements, &"run-a".into(), PlanOptions::default())
        .unwrap_err();
    assert!(matches!(err, ReserveError::Unmet(_)));
    assert_status!(bed, "P1", ResourceStatus::Available);
}

#[test]
fn single_plate_is_shared_when_allowed() {
    let bed = TestBed::new([plate("P1")]);
    let requirements =
        [AssetRequirement::new("plates", ResourceCategory::Plate).with_cardinality(2)];
    let options = PlanOptions::default().with_allow_sharing(true);

    let (plan, holds) = bed
        .engine
        .plan_and_reserve(&requirements, &"run-a".into(), options)
        .unwrap();

    let assignment = plan.assignment("plates").unwrap();
    assert!(assignment.shared);
    assert_eq!(assignment.resource_ids, vec![ResourceId::from("P1"), ResourceId::from("P1")]);
    assert_eq!(holds.len(), 1);
    assert_status!(bed, "P1", ResourceStatus::Reserved);
}

#[test]
fn losing_run_retries_after_release() {
    let bed = TestBed::new([liquid_handler("LH1")]);
    let requirements = [AssetRequirement::new("handler", ResourceCategory::LiquidHandler)];
    let run_a = RunId::from("run-a");
    let run_b = RunId::from("run-b");

    // both runs planned against the same snapshot
    let plan_a = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
    let plan_b = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
    assert_eq!(plan_a, plan_b);

    bed.engine.reserve(&plan_a, &run_a).unwrap();
    let err = bed.engine.reserve(&plan_b, &run_b).unwrap_err();
    let ReserveError::Conflict(conflict) = &err else {
        panic!("expected a conflict, got {err:?}");
    };
    assert_eq!(conflict.held_by, run_a);
    assert!(err.is_retryable());

    bed.engine.release(&run_a).unwrap();
    assert_status!(bed, "LH1", ResourceStatus::Available);

    let (_, holds) = bed
        .engine
        .plan_and_reserve(&requirements, &run_b, PlanOptions::default())
        .unwrap();
    assert_eq!(holds.run_id, run_b);
    assert_status!(bed, "LH1", ResourceStatus::Reserved);
}

#[test]
fn consumption_during_a_run_drops_rack_from_later_plans() {
    let bed = TestBed::new([liquid_handler("LH1"), tip_rack("T1", 60.0)]);
    let requirements = [
        AssetRequirement::new("handler", ResourceCategory::LiquidHandler),
        AssetRequirement::new("tips", ResourceCategory::TipRack).with_min_capacity(50.0),
    ];
    let run = RunId::from("run-a");

    let guard = {
        let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
        bed.engine.reserve_scoped(&plan, &run).unwrap()
    };
    assert!(bed.engine.mark_in_use(&run, &"LH1".into()).unwrap());
    assert_status!(bed, "LH1", ResourceStatus::InUse);

    for _ in 0..3 {
        bed.engine.consume(&"T1".into(), 8.0).unwrap();
    }
    drop(guard);

    assert_status!(bed, "LH1", ResourceStatus::Available);
    assert_eq!(bed.remaining("T1"), Some(36.0));

    let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
    assert_eq!(plan.unmet, ["tips"]);

    bed.engine.refill(&"T1".into()).unwrap();
    let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
    assert!(plan.is_complete());
}

#[test]
fn discarded_instance_is_never_planned_again() {
    let bed = TestBed::new([plate("P1"), plate("P2")]);
    let requirements = [AssetRequirement::new("plate", ResourceCategory::Plate)];
    let run = RunId::from("run-a");

    let (plan, _) = bed
        .engine
        .plan_and_reserve(&requirements, &run, PlanOptions::default())
        .unwrap();
    assert_eq!(plan.resource_ids("plate").unwrap(), [ResourceId::from("P1")]);

    bed.engine.mark_discarded(&"P1".into()).unwrap();
    bed.engine.release(&run).unwrap();
    assert_status!(bed, "P1", ResourceStatus::Discarded);

    let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
    assert_eq!(plan.resource_ids("plate").unwrap(), [ResourceId::from("P2")]);
}
