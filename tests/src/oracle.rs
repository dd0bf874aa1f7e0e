use parking_lot::RwLock;
use std::collections::HashSet;

use labrig_kernel::{RunId, RunStateOracle};

/// Run-state oracle whose answers are set by the test.
///
/// Every run is considered finished until marked live.
#[derive(Debug, Default)]
pub struct ScriptedRunOracle {
    live: RwLock<HashSet<RunId>>,
}

impl ScriptedRunOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_live(&self, run_id: impl Into<RunId>) {
        self.live.write().insert(run_id.into());
    }

    pub fn mark_finished(&self, run_id: impl Into<RunId>) {
        self.live.write().remove(&run_id.into());
    }
}

impl RunStateOracle for ScriptedRunOracle {
    fn is_run_live(&self, run_id: &RunId) -> bool {
        self.live.read().contains(run_id)
    }
}
