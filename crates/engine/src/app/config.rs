use serde::{Deserialize, Serialize};

use super::entity::AnimationTiming;

/// Tunables of the simulation core. Every field is optional in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub tile_size: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub npc_speed: f32,
    pub text_reveal_interval: f32,
    pub fade_speed: f32,
    pub animation_frame_seconds: f32,
    pub animation_frame_count: u32,
    pub arrival_threshold: f32,
    /// Dialogue actions hold the event cursor until their dialogue closes.
    pub await_event_dialogues: bool,
    pub debug: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            walk_speed: 150.0,
            run_speed: 240.0,
            npc_speed: 150.0,
            text_reveal_interval: 0.03,
            fade_speed: 1.0,
            animation_frame_seconds: 0.10,
            animation_frame_count: 9,
            arrival_threshold: 1.0,
            await_event_dialogues: false,
            debug: false,
        }
    }
}

impl SimulationConfig {
    pub fn animation_timing(&self) -> AnimationTiming {
        AnimationTiming {
            frame_seconds: self.animation_frame_seconds,
            frame_count: self.animation_frame_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "run_speed": 300.0, "debug": true }"#).expect("parse");
        assert_eq!(config.run_speed, 300.0);
        assert!(config.debug);
        assert_eq!(config.tile_size, 32.0);
        assert_eq!(config.animation_timing().frame_count, 9);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<SimulationConfig>(r#"{ "tile": 16 }"#).is_err());
    }
}
