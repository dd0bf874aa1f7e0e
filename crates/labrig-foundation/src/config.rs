//! Engine configuration
//!
//! Policy defaults for planning plus the crash-recovery timings. Loaded from any
//! format the kernel config loader understands, with `LABRIG_*` environment
//! overrides.

use error_stack::ResultExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use labrig_kernel::config::load_with_env;
use labrig_kernel::{EngineResult, IntoEngineReport, PlanOptions};

/// Environment prefix for overrides, e.g. `LABRIG_ALLOW_SHARING=true`.
pub const ENV_PREFIX: &str = "LABRIG";

/// Configuration for a [`ResourceEngine`](crate::ResourceEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treat every consumable as unlimited (simulation / dry runs)
    pub infinite_consumables: bool,
    /// Let one instance fill several slots of a requirement
    pub allow_sharing: bool,
    /// Offer instances already in use once available ones run out
    pub allow_in_use: bool,
    /// Active reservations older than this are candidates for recovery
    pub stale_max_age_secs: u64,
    /// How often the background sweeper looks for stale reservations
    pub sweep_interval_secs: u64,
    /// Remaining capacity at or below which a consumable is reported as low
    pub low_stock_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            infinite_consumables: false,
            allow_sharing: false,
            allow_in_use: false,
            stale_max_age_secs: 3600,
            sweep_interval_secs: 300,
            low_stock_threshold: 10.0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for simulated hardware: unlimited consumables, sharing allowed.
    pub fn simulation() -> Self {
        Self {
            infinite_consumables: true,
            allow_sharing: true,
            ..Default::default()
        }
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

    pub fn with_stale_max_age(mut self, max_age: Duration) -> Self {
        self.stale_max_age_secs = max_age.as_secs();
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_secs = interval.as_secs();
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: f64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Default planning options derived from this configuration.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions::new()
            .with_infinite_consumables(self.infinite_consumables)
            .with_allow_sharing(self.allow_sharing)
            .with_allow_in_use(self.allow_in_use)
    }

    pub fn stale_max_age(&self) -> Duration {
        Duration::from_secs(self.stale_max_age_secs)
    }

    /// Never zero; `tokio::time::interval` panics on a zero period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Load from `path`, then apply `LABRIG_*` environment overrides.
    pub fn from_file(path: &str) -> EngineResult<Self> {
        load_with_env::<Self>(path, ENV_PREFIX)
            .into_report()
            .attach(format!("loading engine config from {path}"))
    }
}
