mod collision;
mod config;
mod dialogue;
mod entity;
mod event;
mod frame;
mod geometry;
mod input;
mod loop_runner;
mod map;
mod metrics;
mod scenery;
mod triggers;
mod world;

pub use collision::{
    decode_collision_code, ColliderShift, CollisionGrid, CollisionGridError, NO_COLLIDER,
    OUT_OF_BOUNDS_CODE,
};
pub use config::SimulationConfig;
pub use dialogue::{Dialogue, DialogueEngine, DialogueLine, DialoguePanel, DialogueProgress};
pub use entity::{
    AnimationTiming, Avatar, BodyShape, Npc, NpcHandle, NpcRoster, Player, WalkAnimation,
    NPC_BODY, PLAYER_BODY,
};
pub use event::{
    execute_action, ActionContext, ActionRequest, ActionRunState, EventEngine, EventPhase,
    EventProgress,
};
pub use frame::{DebugOverlay, DrawItem, ModeKind, RenderableFrame, SkippedAction, SpriteRef};
pub use geometry::{Camera2D, Direction, Rect, Vec2};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_replay, run_replay_with_metrics, AppError, LoopConfig, ReplaySummary};
pub use map::{MapEvent, MapLoadError, MapState, PlayerSpawn};
pub use metrics::{MetricsHandle, SimMetricsSnapshot, SimulationStats};
pub use scenery::{DrawPass, PlacedTile, Scenery, LAYER_ALWAYS_ABOVE, LAYER_DRAWABLES};
pub use triggers::{DialogueTrigger, EventTrigger, InteractionIndex, TransitionTrigger};
pub use world::{EventSession, FadePhase, GameMode, TransitionState, WorldSimulation};
