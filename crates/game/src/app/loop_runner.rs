use std::process::ExitCode;

use tracing::{error, info};
use wayfarer_engine::{
    resolve_app_paths, run_replay_with_metrics, AppError, AppPaths, FileMapProvider,
    MetricsHandle, ReplaySummary, WorldSimulation,
};

use super::bootstrap::{load_simulation_config, AppWiring};
use super::input_script::InputScript;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let result = resolve_app_paths()
        .map_err(AppError::from)
        .and_then(|paths| run_session(&paths, &app));
    match result {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                map = summary.final_map.as_str(),
                maps_loaded = summary.stats.maps_loaded,
                events_completed = summary.stats.events_completed,
                "session_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_session(paths: &AppPaths, app: &AppWiring) -> Result<ReplaySummary, AppError> {
    info!(root = %paths.root.display(), maps = %paths.maps_dir.display(), "paths_resolved");
    let config = load_simulation_config(paths)?;
    let script = match &app.input_script {
        Some(path) => InputScript::load(path)?,
        None => InputScript::idle(app.loop_config.target_tps),
    };
    let frames = script.frames();

    let provider = FileMapProvider::new(&paths.maps_dir);
    let mut sim = WorldSimulation::new(config, Box::new(provider), &app.start_map, &app.start_spawn)?;
    let metrics = MetricsHandle::default();
    Ok(run_replay_with_metrics(
        &mut sim,
        &frames,
        &app.loop_config,
        &metrics,
    ))
}
