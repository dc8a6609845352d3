use std::sync::Arc;

use crate::content::{ActionDef, EventDef};

use super::config::SimulationConfig;
use super::entity::{Avatar, NpcHandle, NpcRoster, Player};
use super::geometry::{axis_value, with_axis_value, Camera2D, Direction, Vec2};

/// Per-run mutable state mirroring one authored action. Groups hold one child
/// state plus a completion latch per child.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRunState {
    started: bool,
    target: f32,
    npc: Option<NpcHandle>,
    children: Vec<ChildRun>,
}

#[derive(Debug, Clone, PartialEq)]
struct ChildRun {
    finished: bool,
    state: ActionRunState,
}

impl ActionRunState {
    /// Builds run state for `def`, resolving NPC names against `roster` once.
    pub fn for_action(def: &ActionDef, roster: &NpcRoster) -> Self {
        let npc = match def {
            ActionDef::MoveNpc { npc, .. } => roster.resolve(npc),
            _ => None,
        };
        let children = match def {
            ActionDef::Group { actions } => actions
                .iter()
                .map(|child| ChildRun {
                    finished: false,
                    state: Self::for_action(child, roster),
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            started: false,
            target: 0.0,
            npc,
            children,
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    OpenDialogue(String),
}

/// Everything an action may touch during one tick.
pub struct ActionContext<'a> {
    pub player: &'a mut Player,
    pub npcs: &'a mut NpcRoster,
    pub camera: &'a mut Camera2D,
    pub config: &'a SimulationConfig,
    pub dt: f32,
    /// Whether a dialogue opened by this event is still on screen.
    pub dialogue_open: bool,
    pub requests: Vec<ActionRequest>,
    /// Names of NPCs whose move actions were skipped this tick.
    pub skipped_npcs: Vec<String>,
}

/// Runs `def` for one tick and reports whether it has completed.
pub fn execute_action(
    def: &ActionDef,
    state: &mut ActionRunState,
    ctx: &mut ActionContext<'_>,
) -> bool {
    match def {
        ActionDef::Dialogue { dialogue } => {
            if !state.started {
                state.started = true;
                ctx.requests.push(ActionRequest::OpenDialogue(dialogue.clone()));
                return !ctx.config.await_event_dialogues;
            }
            !ctx.dialogue_open
        }
        ActionDef::MoveNpc {
            npc,
            tiles,
            direction,
            follow,
        } => {
            let resolved = state.npc.and_then(|handle| ctx.npcs.get_mut(handle));
            let Some(target_npc) = resolved else {
                ctx.skipped_npcs.push(npc.clone());
                return true;
            };
            step_avatar(
                target_npc.avatar_mut(),
                state,
                MoveSpec {
                    direction: *direction,
                    tiles: *tiles,
                    follow: *follow,
                },
                ctx.camera,
                ctx.config,
                ctx.dt,
            )
        }
        ActionDef::MovePlayer {
            tiles,
            direction,
            follow,
        } => step_avatar(
            ctx.player.avatar_mut(),
            state,
            MoveSpec {
                direction: *direction,
                tiles: *tiles,
                follow: *follow,
            },
            ctx.camera,
            ctx.config,
            ctx.dt,
        ),
        ActionDef::MoveCamera {
            tiles,
            direction,
            speed,
        } => {
            if !state.started {
                state.started = true;
                state.target = travel_target(ctx.camera.target, *direction, *tiles, ctx.config);
            }
            let current = axis_value(ctx.camera.target, *direction);
            match clamped_step(current, state.target, *speed, ctx.dt, ctx.config) {
                Some(next) => {
                    ctx.camera.target = with_axis_value(ctx.camera.target, *direction, next);
                    false
                }
                None => true,
            }
        }
        ActionDef::Group { actions } => {
            let mut all_finished = true;
            for (child_def, child) in actions.iter().zip(state.children.iter_mut()) {
                if child.finished {
                    continue;
                }
                if execute_action(child_def, &mut child.state, ctx) {
                    child.finished = true;
                } else {
                    all_finished = false;
                }
            }
            all_finished
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MoveSpec {
    direction: Direction,
    tiles: u32,
    follow: bool,
}

fn step_avatar(
    avatar: &mut Avatar,
    state: &mut ActionRunState,
    spec: MoveSpec,
    camera: &mut Camera2D,
    config: &SimulationConfig,
    dt: f32,
) -> bool {
    if !state.started {
        state.started = true;
        avatar.set_facing(spec.direction);
        state.target = travel_target(avatar.position(), spec.direction, spec.tiles, config);
    }
    let current = axis_value(avatar.position(), spec.direction);
    match clamped_step(current, state.target, avatar.speed(), dt, config) {
        Some(next) => {
            avatar.set_position(with_axis_value(avatar.position(), spec.direction, next));
            avatar
                .animation_mut()
                .advance(dt, config.animation_timing());
            if spec.follow {
                camera.center_on(avatar.position(), config.tile_size);
            }
            false
        }
        None => {
            avatar.animation_mut().reset();
            true
        }
    }
}

fn travel_target(origin: Vec2, direction: Direction, tiles: u32, config: &SimulationConfig) -> f32 {
    axis_value(origin, direction) + direction.sign() * tiles as f32 * config.tile_size
}

/// Next coordinate toward `target`, or `None` once within the arrival
/// threshold. Never steps past the target.
fn clamped_step(
    current: f32,
    target: f32,
    speed: f32,
    dt: f32,
    config: &SimulationConfig,
) -> Option<f32> {
    let remaining = target - current;
    if remaining.abs() <= config.arrival_threshold {
        return None;
    }
    let step = (speed * dt).min(remaining.abs());
    Some(current + step.copysign(remaining))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventProgress {
    Running,
    Completed,
}

/// Cursor over one event's top-level actions. Only the action under the
/// cursor runs; its state is created the first tick it becomes live.
#[derive(Debug, Clone)]
pub struct EventEngine {
    event: Arc<EventDef>,
    event_index: usize,
    cursor: usize,
    current: Option<ActionRunState>,
}

impl EventEngine {
    pub fn new(event: Arc<EventDef>, event_index: usize) -> Self {
        Self {
            event,
            event_index,
            cursor: 0,
            current: None,
        }
    }

    pub fn event(&self) -> &EventDef {
        &self.event
    }

    pub fn event_index(&self) -> usize {
        self.event_index
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> EventPhase {
        if self.cursor >= self.event.actions.len() {
            EventPhase::Completed
        } else if self.cursor == 0 && self.current.is_none() {
            EventPhase::Idle
        } else {
            EventPhase::Running
        }
    }

    pub fn tick(&mut self, ctx: &mut ActionContext<'_>) -> EventProgress {
        let event = Arc::clone(&self.event);
        let Some(def) = event.actions.get(self.cursor) else {
            return EventProgress::Completed;
        };
        let state = self
            .current
            .get_or_insert_with(|| ActionRunState::for_action(def, ctx.npcs));
        if execute_action(def, state, ctx) {
            self.cursor += 1;
            self.current = None;
        }
        if self.cursor >= event.actions.len() {
            EventProgress::Completed
        } else {
            EventProgress::Running
        }
    }
}
