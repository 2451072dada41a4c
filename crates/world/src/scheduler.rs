//! Fixed-period restock sweeps.
//!
//! One sweep visits every registered container once: timers that expire on
//! this sweep trigger an automatic restock (which reloads them), every other
//! timer is decremented by one second. Records removed concurrently are
//! skipped silently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use restock_core::{LocationKey, TICKS_PER_SECOND};
use tracing::{debug, info, warn};

use crate::{auto_restock, AutoRestock, ContainerProvider, ContainerRegistry, TickStep};

/// Host ticks between sweeps (one second at 20 TPS).
pub const SWEEP_PERIOD_TICKS: u64 = TICKS_PER_SECOND;

/// Wall-clock period of the background sweep.
pub const SWEEP_PERIOD: Duration =
    Duration::from_millis(1000 * SWEEP_PERIOD_TICKS / TICKS_PER_SECOND);

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records whose timer was decremented.
    pub counted: usize,
    /// Records restocked on this sweep.
    pub restocked: Vec<LocationKey>,
    /// Records dropped because their block no longer qualifies.
    pub removed: Vec<LocationKey>,
}

/// Drives timers of a shared [`ContainerRegistry`].
#[derive(Debug, Clone)]
pub struct RestockScheduler {
    registry: Arc<ContainerRegistry>,
    announce: Arc<AtomicBool>,
}

impl RestockScheduler {
    /// Scheduler with announcements disabled.
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self::with_announce_flag(registry, Arc::new(AtomicBool::new(false)))
    }

    /// Scheduler reading the announcement setting from a shared flag.
    pub fn with_announce_flag(registry: Arc<ContainerRegistry>, announce: Arc<AtomicBool>) -> Self {
        Self { registry, announce }
    }

    /// Registry driven by this scheduler.
    pub fn registry(&self) -> &Arc<ContainerRegistry> {
        &self.registry
    }

    /// Run one sweep against `provider`.
    pub fn sweep<P>(&self, provider: &mut P) -> SweepReport
    where
        P: ContainerProvider + ?Sized,
    {
        let announce = self.announce.load(Ordering::Relaxed);
        let mut report = SweepReport::default();

        for key in self.registry.keys() {
            match self.registry.advance(&key) {
                TickStep::Missing => {}
                TickStep::Counting { .. } => report.counted += 1,
                TickStep::Due => match auto_restock(&self.registry, provider, &key, announce) {
                    AutoRestock::Restocked { .. } => report.restocked.push(key),
                    AutoRestock::Removed => report.removed.push(key),
                    AutoRestock::Skipped => {}
                },
            }
        }
        report
    }

    /// Run sweeps every `period` on a background thread.
    ///
    /// The provider lock is held for the duration of each sweep.
    pub fn spawn<P>(
        self,
        provider: Arc<Mutex<P>>,
        period: Duration,
    ) -> std::io::Result<SchedulerHandle>
    where
        P: ContainerProvider + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let join = thread::Builder::new()
            .name("restock-scheduler".into())
            .spawn(move || {
                info!(period_ms = period.as_millis() as u64, "Restock scheduler started");
                let mut next = Instant::now() + period;
                loop {
                    let now = Instant::now();
                    if now < next {
                        thread::park_timeout(next - now);
                    }
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    if Instant::now() < next {
                        continue;
                    }
                    next += period;

                    let report = {
                        let mut world = provider.lock().unwrap_or_else(PoisonError::into_inner);
                        self.sweep(&mut *world)
                    };
                    debug!(
                        counted = report.counted,
                        restocked = report.restocked.len(),
                        removed = report.removed.len(),
                        "Restock sweep"
                    );
                }
                info!("Restock scheduler stopped");
            })?;

        Ok(SchedulerHandle {
            stop,
            join: Some(join),
        })
    }
}

/// Owner of a running background scheduler. Dropping it stops the thread.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop the thread and wait for the in-flight sweep to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            join.thread().unpark();
            if let Err(panic) = join.join() {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(%message, "Restock scheduler thread panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
