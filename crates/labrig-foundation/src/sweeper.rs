//! Stale-reservation sweeper
//!
//! Runs [`ResourceEngine::recover_stale`] once when started and then on a fixed
//! interval, so holds left behind by crashed runs are reclaimed without operator
//! action.
//!
//! ```rust,ignore
//! let sweeper = StaleReservationSweeper::new(Arc::clone(&engine));
//! sweeper.start();
//! // ...
//! sweeper.shutdown().await;
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use labrig_kernel::{Reservation, StoreError};

use crate::engine::ResourceEngine;

struct SweeperInner {
    engine: Arc<ResourceEngine>,
    interval: Duration,
    max_age: Duration,
    is_running: AtomicBool,
    shutdown: Notify,
    handle: Mutex<Option<JoinHandle<()>>>,
    sweeps: AtomicU64,
    recovered: AtomicU64,
}

impl SweeperInner {
    fn sweep(&self) -> Result<Vec<Reservation>, StoreError> {
        let recovered = self.engine.recover_stale(self.max_age)?;
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.recovered
            .fetch_add(recovered.len() as u64, Ordering::Relaxed);
        Ok(recovered)
    }
}

/// Periodic crash recovery for one engine.
///
/// Cheap to clone; clones share the same background task.
#[derive(Clone)]
pub struct StaleReservationSweeper {
    inner: Arc<SweeperInner>,
}

impl StaleReservationSweeper {
    /// Interval and maximum age come from the engine's configuration.
    pub fn new(engine: Arc<ResourceEngine>) -> Self {
        let interval = engine.config().sweep_interval();
        let max_age = engine.config().stale_max_age();
        Self::with_timings(engine, interval, max_age)
    }

    pub fn with_timings(
        engine: Arc<ResourceEngine>,
        interval: Duration,
        max_age: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SweeperInner {
                engine,
                interval: interval.max(Duration::from_millis(1)),
                max_age,
                is_running: AtomicBool::new(false),
                shutdown: Notify::new(),
                handle: Mutex::new(None),
                sweeps: AtomicU64::new(0),
                recovered: AtomicU64::new(0),
            }),
        }
    }

    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) {
        if self.inner.is_running.swap(true, Ordering::SeqCst) {
            warn!("stale-reservation sweeper is already running");
            return;
        }

        info!(
            interval_secs = self.inner.interval.as_secs(),
            max_age_secs = self.inner.max_age.as_secs(),
            "stale-reservation sweeper started"
        );

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = inner.sweep() {
                            error!(error = %e, "stale-reservation sweep failed");
                        }
                    }
                    _ = inner.shutdown.notified() => {
                        debug!("stale-reservation sweeper stopping");
                        break;
                    }
                }
            }
        });
        *self.inner.handle.lock() = Some(handle);
    }

    /// Stop the loop and wait for an in-flight sweep to finish.
    pub async fn shutdown(&self) {
        if !self.inner.is_running.load(Ordering::SeqCst) {
            return;
        }

        self.inner.shutdown.notify_one();
        let handle = self.inner.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "stale-reservation sweeper task failed");
            }
        }

        self.inner.is_running.store(false, Ordering::SeqCst);
        info!(
            sweeps = self.sweeps(),
            recovered = self.recovered(),
            "stale-reservation sweeper stopped"
        );
    }

    /// Run one sweep on the caller's thread.
    pub fn sweep_now(&self) -> Result<Vec<Reservation>, StoreError> {
        self.inner.sweep()
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_running.load(Ordering::SeqCst)
    }

    /// Completed sweeps.
    pub fn sweeps(&self) -> u64 {
        self.inner.sweeps.load(Ordering::Relaxed)
    }

    /// Reservations force-released so far.
    pub fn recovered(&self) -> u64 {
        self.inner.recovered.load(Ordering::Relaxed)
    }
}
