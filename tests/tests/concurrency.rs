//! Races between runs on the shared engine.

use std::sync::Barrier;
use std::thread;

use labrig_kernel::{
    AssetRequirement, ConsumeError, PlanOptions, ReserveError, ResourceCategory, ResourceStatus,
    RunId,
};
use labrig_testing::fixtures::{liquid_handler, plate, reservoir};
use labrig_testing::{TestBed, assert_status};

const RUNS: usize = 8;

#[test]
fn exactly_one_run_wins_a_contested_handler() {
    let bed = TestBed::new([liquid_handler("LH1"), plate("P1")]);
    let plan = bed
        .engine
        .plan(
            &[
                AssetRequirement::new("handler", ResourceCategory::LiquidHandler),
                AssetRequirement::new("plate", ResourceCategory::Plate),
            ],
            PlanOptions::default(),
        )
        .unwrap();
    let barrier = Barrier::new(RUNS);

    let outcomes: Vec<(RunId, Result<usize, ReserveError>)> = thread::scope(|s| {
        let handles: Vec<_> = (0..RUNS)
            .map(|i| {
                let (bed, plan, barrier) = (&bed, &plan, &barrier);
                s.spawn(move || {
                    let run = RunId::new(format!("run-{i}"));
                    barrier.wait();
                    let outcome = bed.engine.reserve(plan, &run).map(|set| set.len());
                    (run, outcome)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<&RunId> = outcomes
        .iter()
        .filter_map(|(run, outcome)| outcome.as_ref().ok().map(|_| run))
        .collect();
    assert_eq!(winners.len(), 1);
    let winner = winners[0];

    for (run, outcome) in &outcomes {
        match outcome {
            Ok(held) => assert_eq!(*held, 2),
            Err(ReserveError::Conflict(conflict)) => {
                assert_ne!(run, winner);
                assert_eq!(&conflict.held_by, winner);
            }
            Err(other) => panic!("{run} failed unexpectedly: {other}"),
        }
    }

    let active = bed.engine.inspect().unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|r| &r.run_id == winner));
    assert_status!(bed, "LH1", ResourceStatus::Reserved);
    assert_status!(bed, "P1", ResourceStatus::Reserved);
}

#[test]
fn disjoint_plans_reserve_in_parallel() {
    let bed = TestBed::new((0..RUNS).map(|i| plate(&format!("P{i}"))));
    let barrier = Barrier::new(RUNS);

    thread::scope(|s| {
        for i in 0..RUNS {
            let (bed, barrier) = (&bed, &barrier);
            s.spawn(move || {
                let plan = bed.engine.plan_with_snapshot(
                    &[AssetRequirement::new("plate", ResourceCategory::Plate)],
                    &[plate(&format!("P{i}"))],
                    PlanOptions::default(),
                );
                barrier.wait();
                bed.engine
                    .reserve(&plan, &RunId::new(format!("run-{i}")))
                    .unwrap();
            });
        }
    });

    assert_eq!(bed.engine.inspect().unwrap().len(), RUNS);
    assert!(
        bed.snapshot()
            .iter()
            .all(|inst| inst.status == ResourceStatus::Reserved)
    );
}

#[test]
fn concurrent_draws_never_overdraw() {
    let bed = TestBed::new([reservoir("R1", 100.0)]);
    let barrier = Barrier::new(RUNS);

    let granted: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..RUNS)
            .map(|_| {
                let (bed, barrier) = (&bed, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    let mut granted = 0;
                    for _ in 0..20 {
                        match bed.engine.consume(&"R1".into(), 1.0) {
                            Ok(Some(left)) => {
                                assert!(left >= 0.0);
                                granted += 1;
                            }
                            Err(ConsumeError::Depleted(_)) => {}
                            other => panic!("unexpected outcome: {other:?}"),
                        }
                    }
                    granted
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(granted, 100);
    assert_eq!(bed.remaining("R1"), Some(0.0));
}

#[test]
fn release_races_with_reserve_on_the_same_instance() {
    let bed = TestBed::new([liquid_handler("LH1")]);
    let requirements = [AssetRequirement::new("handler", ResourceCategory::LiquidHandler)];
    let plan = bed.engine.plan(&requirements, PlanOptions::default()).unwrap();
    let holder = RunId::from("holder");
    bed.engine.reserve(&plan, &holder).unwrap();
    let barrier = Barrier::new(2);

    let contender = thread::scope(|s| {
        let (bed, barrier, holder, plan) = (&bed, &barrier, &holder, &plan);
        s.spawn(move || {
            barrier.wait();
            bed.engine.release(holder).unwrap();
        });
        let attempt = s.spawn(move || {
            barrier.wait();
            bed.engine.reserve(plan, &"contender".into())
        });
        attempt.join().unwrap()
    });

    match contender {
        Ok(set) => {
            assert_eq!(set.len(), 1);
            assert_status!(bed, "LH1", ResourceStatus::Reserved);
        }
        Err(ReserveError::Conflict(conflict)) => {
            assert_eq!(conflict.held_by, holder);
            assert_status!(bed, "LH1", ResourceStatus::Available);
            assert!(bed.engine.inspect().unwrap().is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
    }
}
