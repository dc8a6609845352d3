use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

/// Lifetime counters kept by the simulation itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub maps_loaded: u64,
    pub transitions_failed: u64,
    pub events_completed: u64,
    pub dialogues_opened: u64,
    pub actions_skipped: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimMetricsSnapshot {
    pub stats: SimulationStats,
    /// Mean wall-clock cost of one `advance` call over the last interval.
    pub tick_time_ms: f32,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<SimMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(SimMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> SimMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: SimMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

/// Averages tick cost over a fixed number of ticks.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_ticks: u32,
    ticks: u32,
    tick_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval_ticks: u32) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            ticks: 0,
            tick_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_tick(&mut self, tick_time: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.tick_time_sum = self.tick_time_sum.saturating_add(tick_time);
    }

    pub(crate) fn maybe_snapshot(&mut self, stats: SimulationStats) -> Option<SimMetricsSnapshot> {
        if self.ticks < self.interval_ticks {
            return None;
        }
        let snapshot = SimMetricsSnapshot {
            stats,
            tick_time_ms: (self.tick_time_sum.as_secs_f32() / self.ticks as f32) * 1000.0,
        };
        self.ticks = 0;
        self.tick_time_sum = Duration::ZERO;
        Some(snapshot)
    }
}
