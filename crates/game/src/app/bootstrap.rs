use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;
use wayfarer_engine::{read_json_file, AppError, AppPaths, LoopConfig, SimulationConfig};

const START_MAP_ENV_VAR: &str = "WAYFARER_START_MAP";
const START_SPAWN_ENV_VAR: &str = "WAYFARER_START_SPAWN";
const INPUT_SCRIPT_ENV_VAR: &str = "WAYFARER_INPUT_SCRIPT";
const DEFAULT_START_MAP: &str = "mapa_dungeon";
const DEFAULT_START_SPAWN: &str = "player_1";

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) start_map: String,
    pub(crate) start_spawn: String,
    pub(crate) input_script: Option<PathBuf>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Wayfarer Startup ===");

    let wiring = AppWiring {
        loop_config: LoopConfig::default(),
        start_map: env_or_default(START_MAP_ENV_VAR, DEFAULT_START_MAP),
        start_spawn: env_or_default(START_SPAWN_ENV_VAR, DEFAULT_START_SPAWN),
        input_script: env::var_os(INPUT_SCRIPT_ENV_VAR)
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from),
    };
    info!(
        map = wiring.start_map.as_str(),
        spawn = wiring.start_spawn.as_str(),
        scripted = wiring.input_script.is_some(),
        "start_selected"
    );
    wiring
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn env_or_default(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Reads `assets/config.json` when present; every field falls back to its default.
pub(crate) fn load_simulation_config(paths: &AppPaths) -> Result<SimulationConfig, AppError> {
    if !paths.config_path.is_file() {
        info!(path = %paths.config_path.display(), "config_defaults");
        return Ok(SimulationConfig::default());
    }
    let config: SimulationConfig = read_json_file(&paths.config_path)?;
    info!(
        path = %paths.config_path.display(),
        debug = config.debug,
        await_event_dialogues = config.await_event_dialogues,
        "config_loaded"
    );
    Ok(config)
}
