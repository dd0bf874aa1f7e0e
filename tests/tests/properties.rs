//! Engine-wide invariants checked against the in-memory stores.

use labrig_foundation::StaticTaxonomy;
use labrig_kernel::{
    AssetRequirement, ConsumeError, PlanOptions, ReservationLedger, ReserveError,
    ResourceCategory, ResourceInstance, ResourceStatus, RunId,
};
use labrig_testing::fixtures::{liquid_handler, plate, plate_carrier, reservoir, tip_rack};
use labrig_testing::{TestBed, assert_status};

#[test]
fn category_match_is_exact() {
    let bed = TestBed::new([plate_carrier("C1")]);
    let plan = bed
        .engine
        .plan(
            &[AssetRequirement::new("plate", ResourceCategory::Plate)],
            PlanOptions::default(),
        )
        .unwrap();
    assert_eq!(plan.unmet, ["plate"]);

    let plan = bed
        .engine
        .plan(
            &[AssetRequirement::new("carrier", ResourceCategory::Carrier)],
            PlanOptions::default(),
        )
        .unwrap();
    assert!(plan.is_complete());
}

#[test]
fn classification_comes_only_from_the_taxonomy() {
    let taxonomy = StaticTaxonomy::new()
        .with_entry("PLT_CAR_L5AC", ResourceCategory::Carrier)
        .with_entry("Cor_96_wellplate_360ul_Fb", ResourceCategory::Plate);
    let bed = TestBed::with_taxonomy(
        [
            ResourceInstance::unclassified("C1", "PLT_CAR_L5AC"),
            // looks like a plate by name, but the taxonomy has no entry for it
            ResourceInstance::unclassified("X1", "Plate_96_custom"),
        ],
        taxonomy,
    );

    let plan = bed
        .engine
        .plan(
            &[
                AssetRequirement::new("plate", ResourceCategory::Plate).optional(),
                AssetRequirement::from_type_hint("carrier", "PLT_CAR_L5AC"),
            ],
            PlanOptions::default(),
        )
        .unwrap();

    assert!(plan.is_complete());
    assert!(plan.resource_ids("plate").unwrap().is_empty());
    assert_eq!(plan.resource_ids("carrier").unwrap()[0].as_str(), "C1");
    assert_eq!(plan.gaps.len(), 1);
}

#[test]
fn at_most_one_active_reservation_per_instance() {
    let bed = TestBed::new([liquid_handler("LH1"), plate("P1")]);
    let requirements = [
        AssetRequirement::new("handler", ResourceCategory::LiquidHandler),
        AssetRequirement::new("plate", ResourceCategory::Plate),
    ];
    let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();

    bed.engine.reserve(&plan, &"run-a".into()).unwrap();
    for run in ["run-a", "run-b", "run-c"] {
        assert!(matches!(
            bed.engine.reserve(&plan, &run.into()),
            Err(ReserveError::Conflict(_))
        ));
    }

    for id in ["LH1", "P1"] {
        assert!(bed.ledger.active_for_resource(&id.into()).unwrap().is_some());
    }
    assert_eq!(bed.engine.inspect().unwrap().len(), 2);
    assert_eq!(bed.ledger.history().len(), 2);
}

#[test]
fn release_is_idempotent() {
    let bed = TestBed::new([plate("P1")]);
    let run = RunId::from("run-a");
    bed.engine
        .plan_and_reserve(
            &[AssetRequirement::new("plate", ResourceCategory::Plate)],
            &run,
            PlanOptions::default(),
        )
        .unwrap();

    assert_eq!(bed.engine.release(&run).unwrap().len(), 1);
    let after_first = bed.snapshot();
    for _ in 0..3 {
        assert!(bed.engine.release(&run).unwrap().is_empty());
    }
    assert_eq!(bed.snapshot(), after_first);
    assert_eq!(bed.ledger.history().len(), 1);
}

#[test]
fn reserve_then_release_restores_inventory() {
    let bed = TestBed::new([
        liquid_handler("LH1"),
        plate("P1"),
        plate("P2"),
        tip_rack("T1", 40.0),
        reservoir("R1", 250.0),
    ]);
    bed.inventory.insert(plate("P3").with_status(ResourceStatus::InUse));
    let before = bed.snapshot();

    let requirements = [
        AssetRequirement::new("handler", ResourceCategory::LiquidHandler),
        AssetRequirement::new("plates", ResourceCategory::Plate).with_cardinality(3),
        AssetRequirement::new("tips", ResourceCategory::TipRack),
        AssetRequirement::new("buffer", ResourceCategory::Reservoir),
    ];
    let options = PlanOptions::default().with_allow_in_use(true);
    let run = RunId::from("run-a");

    let (_, holds) = bed
        .engine
        .plan_and_reserve(&requirements, &run, options)
        .unwrap();
    assert_eq!(holds.len(), 6);
    assert_eq!(holds.get(&"P3".into()).unwrap().prior_status, ResourceStatus::InUse);
    assert!(
        bed.snapshot()
            .iter()
            .all(|inst| inst.status == ResourceStatus::Reserved)
    );

    bed.engine.release(&run).unwrap();
    assert_eq!(bed.snapshot(), before);
    assert_status!(bed, "P3", ResourceStatus::InUse);
}

#[test]
fn remaining_capacity_never_goes_negative() {
    let bed = TestBed::new([reservoir("R1", 100.0)]);
    let id = "R1".into();
    let draws = [30.0, 30.0, 30.0, 30.0, 10.0, 0.0, 5.0];

    let mut expected = 100.0;
    for amount in draws {
        match bed.engine.consume(&id, amount) {
            Ok(Some(left)) => {
                expected -= amount;
                assert_eq!(left, expected);
            }
            Ok(None) => panic!("capacity is tracked"),
            Err(ConsumeError::Depleted(e)) => {
                assert_eq!(e.remaining, expected);
                assert!(amount > expected);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
        assert!(bed.remaining("R1").unwrap() >= 0.0);
    }
    assert_eq!(bed.remaining("R1"), Some(0.0));
    assert!(bed.engine.is_low_stock(&id, 0.0).unwrap());
}

#[test]
fn conflicting_attempt_leaves_no_trace() {
    let bed = TestBed::new([liquid_handler("LH1"), plate("P1"), plate("P2")]);
    bed.engine
        .plan_and_reserve(
            &[AssetRequirement::new("handler", ResourceCategory::LiquidHandler)],
            &"run-a".into(),
            PlanOptions::default(),
        )
        .unwrap();
    let before = bed.snapshot();

    let plan = bed
        .engine
        .plan_with_snapshot(
            &[
                AssetRequirement::new("src", ResourceCategory::Plate),
                AssetRequirement::new("handler", ResourceCategory::LiquidHandler),
                AssetRequirement::new("dst", ResourceCategory::Plate),
            ],
            // stale snapshot from before run-a took the handler
            &[liquid_handler("LH1"), plate("P1"), plate("P2")],
            PlanOptions::default(),
        );
    let err = bed.engine.reserve(&plan, &"run-b".into()).unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(bed.snapshot(), before);
    assert!(bed.ledger.active_for_run(&"run-b".into()).unwrap().is_empty());
}
