//! Crash recovery of holds whose run is gone.

use std::sync::Arc;
use std::time::Duration;

use labrig_foundation::{EngineConfig, StaleReservationSweeper};
use labrig_kernel::{AssetRequirement, PlanOptions, ResourceCategory, ResourceStatus, RunId};
use labrig_testing::fixtures::{liquid_handler, plate, reservoir};
use labrig_testing::{TestBed, assert_status};

const MAX_AGE: Duration = Duration::from_secs(600);

fn reserve(bed: &TestBed, run: &str, category: ResourceCategory) {
    bed.engine
        .plan_and_reserve(
            &[AssetRequirement::new(run, category)],
            &RunId::from(run),
            PlanOptions::default(),
        )
        .unwrap();
}

#[test]
fn only_old_holds_of_dead_runs_are_reclaimed() {
    let bed = TestBed::new([liquid_handler("LH1"), plate("P1"), plate("P2")]);
    bed.runs.mark_live("alive");

    reserve(&bed, "crashed", ResourceCategory::LiquidHandler);
    reserve(&bed, "alive", ResourceCategory::Plate);
    bed.clock.advance(MAX_AGE + Duration::from_secs(1));
    // recent hold of a run the oracle does not know
    reserve(&bed, "fresh", ResourceCategory::Plate);

    let recovered = bed.engine.recover_stale(MAX_AGE).unwrap();

    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].run_id.as_str(), "crashed");
    assert!(recovered[0].released_at.is_some());
    assert_status!(bed, "LH1", ResourceStatus::Available);
    assert_status!(bed, "P1", ResourceStatus::Reserved);
    assert_status!(bed, "P2", ResourceStatus::Reserved);

    let active: Vec<String> = bed
        .engine
        .inspect()
        .unwrap()
        .into_iter()
        .map(|r| r.run_id.to_string())
        .collect();
    assert_eq!(active, ["alive", "fresh"]);
}

#[test]
fn finished_run_is_reclaimed_once_old_enough() {
    let bed = TestBed::new([liquid_handler("LH1")]);
    bed.runs.mark_live("run-a");
    reserve(&bed, "run-a", ResourceCategory::LiquidHandler);

    bed.clock.advance(MAX_AGE * 2);
    assert!(bed.engine.recover_stale(MAX_AGE).unwrap().is_empty());

    bed.runs.mark_finished("run-a");
    assert_eq!(bed.engine.recover_stale(MAX_AGE).unwrap().len(), 1);
    assert!(bed.engine.recover_stale(MAX_AGE).unwrap().is_empty());
    assert_status!(bed, "LH1", ResourceStatus::Available);

    reserve(&bed, "run-b", ResourceCategory::LiquidHandler);
    assert_status!(bed, "LH1", ResourceStatus::Reserved);
}

#[test]
fn in_use_instance_returns_to_available_after_recovery() {
    let bed = TestBed::new([liquid_handler("LH1")]);
    reserve(&bed, "crashed", ResourceCategory::LiquidHandler);
    assert!(
        bed.engine
            .mark_in_use(&"crashed".into(), &"LH1".into())
            .unwrap()
    );

    bed.clock.advance(MAX_AGE + Duration::from_secs(1));
    bed.engine.recover_stale(MAX_AGE).unwrap();

    assert_status!(bed, "LH1", ResourceStatus::Available);
}

#[test]
fn recovery_ends_a_crashed_dry_run() {
    let bed = TestBed::new([liquid_handler("LH1"), reservoir("R1", 50.0)]);
    let run = RunId::from("dry-run");
    bed.engine
        .plan_and_reserve(
            &[
                AssetRequirement::new("handler", ResourceCategory::LiquidHandler),
                AssetRequirement::new("buffer", ResourceCategory::Reservoir),
            ],
            &run,
            PlanOptions::default().with_infinite_consumables(true),
        )
        .unwrap();
    assert!(bed.engine.consumables().is_infinite_run(&run));

    bed.clock.advance(MAX_AGE * 2);
    assert_eq!(bed.engine.recover_stale(MAX_AGE).unwrap().len(), 2);

    assert!(!bed.engine.consumables().is_infinite_run(&run));
    assert!(bed.engine.consume(&"R1".into(), 80.0).is_err());
    assert_eq!(bed.remaining("R1"), Some(50.0));
}

#[tokio::test(start_paused = true)]
async fn sweeper_reclaims_holds_in_the_background() {
    let config = EngineConfig::default()
        .with_stale_max_age(MAX_AGE)
        .with_sweep_interval(Duration::from_secs(60));
    let bed = TestBed::with_config([liquid_handler("LH1"), plate("P1")], config);
    reserve(&bed, "crashed", ResourceCategory::LiquidHandler);

    let sweeper = StaleReservationSweeper::new(Arc::clone(&bed.engine));
    sweeper.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(sweeper.sweeps(), 1);
    assert_eq!(sweeper.recovered(), 0);

    bed.clock.advance(MAX_AGE + Duration::from_secs(1));
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(sweeper.sweeps(), 2);
    assert_eq!(sweeper.recovered(), 1);
    assert_status!(bed, "LH1", ResourceStatus::Available);

    sweeper.shutdown().await;
    assert!(!sweeper.is_running());
}
