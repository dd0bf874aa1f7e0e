//! Inventory builders and the [`TestBed`].

use std::sync::Arc;

use labrig_foundation::{
    EngineConfig, InMemoryInventory, InMemoryReservationLedger, ResourceEngine, StaticTaxonomy,
};
use labrig_kernel::{InventoryStore, ResourceCategory, ResourceInstance, ResourceStatus};

use crate::clock::ManualClock;
use crate::oracle::ScriptedRunOracle;

pub fn plate(id: &str) -> ResourceInstance {
    ResourceInstance::new(id, "Cor_96_wellplate_360ul_Fb", ResourceCategory::Plate)
}

/// A 96-tip rack with `remaining` tips left.
pub fn tip_rack(id: &str, remaining: f64) -> ResourceInstance {
    ResourceInstance::new(id, "HTF_L", ResourceCategory::TipRack)
        .with_capacity(96.0)
        .with_remaining(remaining)
}

/// A trough holding `volume_ul` microlitres.
pub fn reservoir(id: &str, volume_ul: f64) -> ResourceInstance {
    ResourceInstance::new(id, "Trough_300ml", ResourceCategory::Reservoir).with_capacity(volume_ul)
}

pub fn liquid_handler(id: &str) -> ResourceInstance {
    ResourceInstance::new(id, "STAR", ResourceCategory::LiquidHandler)
}

pub fn plate_carrier(id: &str) -> ResourceInstance {
    ResourceInstance::new(id, "PlateCarrier", ResourceCategory::Carrier)
}

/// An engine over in-memory stores with a manual clock and a scripted oracle.
pub struct TestBed {
    pub inventory: Arc<InMemoryInventory>,
    pub ledger: Arc<InMemoryReservationLedger>,
    pub clock: Arc<ManualClock>,
    pub runs: Arc<ScriptedRunOracle>,
    pub engine: Arc<ResourceEngine>,
}

impl TestBed {
    pub fn new(instances: impl IntoIterator<Item = ResourceInstance>) -> Self {
        Self::build(instances, EngineConfig::default(), None)
    }

    pub fn with_config(
        instances: impl IntoIterator<Item = ResourceInstance>,
        config: EngineConfig,
    ) -> Self {
        Self::build(instances, config, None)
    }

    pub fn with_taxonomy(
        instances: impl IntoIterator<Item = ResourceInstance>,
        taxonomy: StaticTaxonomy,
    ) -> Self {
        Self::build(instances, EngineConfig::default(), Some(taxonomy))
    }

    fn build(
        instances: impl IntoIterator<Item = ResourceInstance>,
        config: EngineConfig,
        taxonomy: Option<StaticTaxonomy>,
    ) -> Self {
        let inventory = InMemoryInventory::shared(instances);
        let ledger = InMemoryReservationLedger::shared();
        let clock = Arc::new(ManualClock::starting_now());
        let runs = Arc::new(ScriptedRunOracle::new());

        let mut builder = ResourceEngine::builder()
            .with_config(config)
            .with_inventory(inventory.clone())
            .with_ledger(ledger.clone())
            .with_run_state(runs.clone())
            .with_clock(clock.clone());
        if let Some(taxonomy) = taxonomy {
            builder = builder.with_categories(Arc::new(taxonomy));
        }
        let engine = match builder.build() {
            Ok(engine) => Arc::new(engine),
            Err(report) => panic!("test bed engine failed to build: {report:?}"),
        };

        Self {
            inventory,
            ledger,
            clock,
            runs,
            engine,
        }
    }

    /// # Panics
    ///
    /// Panics if the instance is not in the inventory.
    pub fn instance(&self, id: &str) -> ResourceInstance {
        match self.inventory.get(&id.into()) {
            Ok(Some(instance)) => instance,
            other => panic!("instance {id} not readable: {other:?}"),
        }
    }

    pub fn status(&self, id: &str) -> ResourceStatus {
        self.instance(id).status
    }

    pub fn remaining(&self, id: &str) -> Option<f64> {
        self.instance(id).capacity_remaining
    }

    /// Full inventory contents, sorted by id.
    pub fn snapshot(&self) -> Vec<ResourceInstance> {
        match self.inventory.snapshot() {
            Ok(all) => all,
            Err(e) => panic!("in-memory snapshot failed: {e}"),
        }
    }
}
