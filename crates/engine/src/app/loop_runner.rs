use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::content::ContentError;
use crate::StartupError;

use super::frame::ModeKind;
use super::geometry::Vec2;
use super::input::InputSnapshot;
use super::map::MapLoadError;
use super::metrics::{MetricsAccumulator, MetricsHandle, SimulationStats};
use super::world::WorldSimulation;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub metrics_log_interval_ticks: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            metrics_log_interval_ticks: 60,
        }
    }
}

impl LoopConfig {
    pub fn fixed_dt(&self) -> f32 {
        Duration::from_secs_f64(1.0 / f64::from(self.target_tps.max(1))).as_secs_f32()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    MapLoad(#[from] MapLoadError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub ticks: u64,
    pub final_mode: ModeKind,
    pub final_map: String,
    pub player_position: Vec2,
    pub stats: SimulationStats,
}

pub fn run_replay(
    sim: &mut WorldSimulation,
    frames: &[InputSnapshot],
    config: &LoopConfig,
) -> ReplaySummary {
    run_replay_with_metrics(sim, frames, config, &MetricsHandle::default())
}

/// Advances `sim` once per scripted input frame at the fixed tick delta,
/// publishing metrics every `metrics_log_interval_ticks` ticks.
pub fn run_replay_with_metrics(
    sim: &mut WorldSimulation,
    frames: &[InputSnapshot],
    config: &LoopConfig,
    metrics_handle: &MetricsHandle,
) -> ReplaySummary {
    let fixed_dt = config.fixed_dt();
    let mut metrics_accumulator = MetricsAccumulator::new(config.metrics_log_interval_ticks);
    info!(
        target_tps = config.target_tps.max(1),
        frames = frames.len(),
        metrics_log_interval_ticks = config.metrics_log_interval_ticks,
        "loop_config"
    );

    let mut mode = sim.mode().kind();
    let mut map = sim.map().name().to_string();
    let mut ticks = 0u64;
    for input in frames {
        let started = Instant::now();
        let frame = sim.advance(input, fixed_dt);
        metrics_accumulator.record_tick(started.elapsed());
        ticks += 1;

        if frame.mode != mode {
            info!(tick = ticks, from = ?mode, to = ?frame.mode, "mode_changed");
            mode = frame.mode;
        }
        if frame.map != map {
            info!(tick = ticks, from = map.as_str(), to = frame.map.as_str(), "map_changed");
            map = frame.map;
        }

        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(sim.stats()) {
            metrics_handle.publish(snapshot);
            info!(
                ticks = snapshot.stats.ticks,
                tick_time_ms = snapshot.tick_time_ms,
                maps_loaded = snapshot.stats.maps_loaded,
                events_completed = snapshot.stats.events_completed,
                dialogues_opened = snapshot.stats.dialogues_opened,
                actions_skipped = snapshot.stats.actions_skipped,
                "sim_metrics"
            );
        }
    }

    let summary = ReplaySummary {
        ticks,
        final_mode: sim.mode().kind(),
        final_map: sim.map().name().to_string(),
        player_position: sim.player().position(),
        stats: sim.stats(),
    };
    info!(
        ticks = summary.ticks,
        mode = ?summary.final_mode,
        map = summary.final_map.as_str(),
        x = summary.player_position.x,
        y = summary.player_position.y,
        "replay_finished"
    );
    summary
}
