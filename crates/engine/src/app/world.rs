use std::mem;

use tracing::{debug, info, warn};

use crate::content::MapDataProvider;

use super::config::SimulationConfig;
use super::dialogue::{DialogueEngine, DialogueProgress};
use super::entity::Player;
use super::event::{ActionContext, ActionRequest, EventEngine, EventProgress};
use super::frame::{build_draw_list, DebugOverlay, ModeKind, RenderableFrame, SkippedAction};
use super::geometry::{Camera2D, Direction, Rect};
use super::input::{InputAction, InputSnapshot};
use super::map::{MapLoadError, MapState};
use super::metrics::SimulationStats;
use super::triggers::InteractionIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    Out,
    In,
}

#[derive(Debug, Clone)]
pub struct TransitionState {
    pub map: String,
    pub spawn: String,
    pub area: Rect,
    pub phase: FadePhase,
    /// Event bound on the tick the transition fired. Dropped with the old map
    /// on a successful load, resumed if the load fails.
    pub interrupted_event: Option<EventSession>,
}

/// A running event and at most one dialogue it opened.
#[derive(Debug, Clone)]
pub struct EventSession {
    pub engine: EventEngine,
    pub dialogue: Option<DialogueEngine>,
}

#[derive(Debug, Clone)]
pub enum GameMode {
    Normal,
    Transitioning(TransitionState),
    Dialogue(DialogueEngine),
    Event(EventSession),
}

impl GameMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            GameMode::Normal => ModeKind::Normal,
            GameMode::Transitioning(_) => ModeKind::Transitioning,
            GameMode::Dialogue(_) => ModeKind::Dialogue,
            GameMode::Event(_) => ModeKind::Event,
        }
    }
}

#[derive(Debug, Default)]
struct TickReport {
    colliders: Vec<Rect>,
    interaction_zone: Option<Rect>,
    skipped_actions: Vec<SkippedAction>,
}

/// Authoritative world state: the loaded map, the player, the camera and the
/// current game mode. Advanced once per frame by [`WorldSimulation::advance`].
pub struct WorldSimulation {
    config: SimulationConfig,
    provider: Box<dyn MapDataProvider>,
    map: MapState,
    spawn: String,
    player: Player,
    camera: Camera2D,
    mode: GameMode,
    fade_alpha: f32,
    debug: bool,
    next_generation: u64,
    map_time: f64,
    /// Transition area whose load failed; ignored until the player leaves it.
    blocked_transition: Option<Rect>,
    last_load_error: Option<String>,
    stats: SimulationStats,
}

impl WorldSimulation {
    pub fn new(
        config: SimulationConfig,
        provider: Box<dyn MapDataProvider>,
        map: &str,
        spawn: &str,
    ) -> Result<Self, MapLoadError> {
        let data = provider.load_map(map)?;
        let state = MapState::build(&data, spawn, 1, &config)?;
        let player_spawn = state.player_spawn();
        let player = Player::new(
            player_spawn.position,
            player_spawn.facing.unwrap_or(Direction::Down),
            config.walk_speed,
        );
        let mut camera = Camera2D::default();
        camera.center_on(player.position(), config.tile_size);

        info!(
            map = state.name(),
            spawn,
            generation = state.generation(),
            npcs = state.npcs().len(),
            events = state.events().len(),
            "map_loaded"
        );

        Ok(Self {
            debug: config.debug,
            config,
            provider,
            map: state,
            spawn: spawn.to_string(),
            player,
            camera,
            mode: GameMode::Normal,
            fade_alpha: 0.0,
            next_generation: 2,
            map_time: 0.0,
            blocked_transition: None,
            last_load_error: None,
            stats: SimulationStats {
                maps_loaded: 1,
                ..SimulationStats::default()
            },
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn map(&self) -> &MapState {
        &self.map
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> Camera2D {
        self.camera
    }

    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    pub fn fade_alpha(&self) -> f32 {
        self.fade_alpha
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    /// Message of the most recent failed map load, if any.
    pub fn last_load_error(&self) -> Option<&str> {
        self.last_load_error.as_deref()
    }

    /// Replaces the current map immediately, abandoning any running mode.
    /// On error the current map is left untouched.
    pub fn load_map(&mut self, map: &str, spawn: &str) -> Result<(), MapLoadError> {
        self.switch_map(map, spawn)?;
        self.mode = GameMode::Normal;
        self.fade_alpha = 0.0;
        self.camera
            .center_on(self.player.position(), self.config.tile_size);
        Ok(())
    }

    /// Reloads the current map from the provider. Resets event flags.
    pub fn reload(&mut self) -> Result<(), MapLoadError> {
        let map = self.map.name().to_string();
        let spawn = self.spawn.clone();
        self.load_map(&map, &spawn)
    }

    pub fn advance(&mut self, input: &InputSnapshot, dt: f32) -> RenderableFrame {
        self.stats.ticks += 1;
        self.map_time += f64::from(dt);
        if input.was_pressed(InputAction::ToggleDebug) {
            self.debug = !self.debug;
            debug!(enabled = self.debug, "debug_toggled");
        }
        if let Some(direction) = input.last_direction_pressed() {
            self.player.remember_direction_key(direction);
        }

        let mut report = TickReport::default();
        let mode = mem::replace(&mut self.mode, GameMode::Normal);
        self.mode = match mode {
            GameMode::Normal => self.tick_normal(input, dt, &mut report),
            GameMode::Transitioning(state) => self.tick_transition(state, dt),
            GameMode::Dialogue(engine) => self.tick_dialogue(engine, input, dt),
            GameMode::Event(session) => self.tick_event(session, input, dt, &mut report),
        };

        if !matches!(self.mode, GameMode::Event(_)) {
            self.camera
                .center_on(self.player.position(), self.config.tile_size);
        }
        self.frame(report)
    }

    fn tick_normal(
        &mut self,
        input: &InputSnapshot,
        dt: f32,
        report: &mut TickReport,
    ) -> GameMode {
        if input.was_pressed(InputAction::Interact) {
            let zone = self.player.interaction_zone();
            report.interaction_zone = Some(zone);
            if let Some(engine) = self.interact(zone) {
                return GameMode::Dialogue(engine);
            }
        }

        self.move_player(input, dt, report);

        let body = self.player.body();
        if self
            .blocked_transition
            .is_some_and(|area| !area.intersects(&body))
        {
            self.blocked_transition = None;
        }

        let event_index = self
            .map
            .triggers()
            .event_at(&body, |index| self.map.is_event_triggered(index))
            .map(|trigger| trigger.event_index);
        let bound_event = event_index.and_then(|index| self.bind_event(index));

        let transition = self
            .map
            .triggers()
            .transition_at(&body)
            .filter(|trigger| self.blocked_transition != Some(trigger.area))
            .cloned();
        if let Some(trigger) = transition {
            info!(
                from = self.map.name(),
                to = trigger.map.as_str(),
                spawn = trigger.spawn.as_str(),
                interrupted_event = bound_event.is_some(),
                "transition_started"
            );
            return GameMode::Transitioning(TransitionState {
                map: trigger.map,
                spawn: trigger.spawn,
                area: trigger.area,
                phase: FadePhase::Out,
                interrupted_event: bound_event,
            });
        }

        match bound_event {
            Some(session) => GameMode::Event(session),
            None => GameMode::Normal,
        }
    }

    /// Dialogue points under the body win over NPCs in the interaction zone.
    fn interact(&mut self, zone: Rect) -> Option<DialogueEngine> {
        let body = self.player.body();
        if let Some(trigger) = self.map.triggers().dialogue_at(&body) {
            let dialogue = trigger.dialogue.clone();
            return Some(self.open_dialogue(DialogueEngine::open(
                dialogue,
                None,
                self.config.text_reveal_interval,
            )));
        }

        let handle = InteractionIndex::npc_in_zone(&zone, self.map.npcs())?;
        let facing = self.player.facing().opposite();
        let npc = self.map.npcs_mut().get_mut(handle)?;
        npc.avatar_mut().set_facing(facing);
        let dialogue = npc.dialogue()?.clone();
        Some(self.open_dialogue(DialogueEngine::open(
            dialogue,
            Some(handle),
            self.config.text_reveal_interval,
        )))
    }

    fn open_dialogue(&mut self, engine: DialogueEngine) -> DialogueEngine {
        self.player.avatar_mut().animation_mut().reset();
        self.stats.dialogues_opened += 1;
        info!(
            dialogue = engine.dialogue().name.as_str(),
            lines = engine.dialogue().lines.len(),
            "dialogue_opened"
        );
        engine
    }

    fn close_dialogue(&mut self, engine: &DialogueEngine) {
        if let Some(npc) = engine
            .npc()
            .and_then(|handle| self.map.npcs_mut().get_mut(handle))
        {
            npc.restore_default_facing();
        }
        info!(dialogue = engine.dialogue().name.as_str(), "dialogue_closed");
    }

    /// Per-axis resolution: X is tested and committed before Y, so sliding
    /// along a wall keeps the unblocked component.
    fn move_player(&mut self, input: &InputSnapshot, dt: f32, report: &mut TickReport) {
        let speed = if input.is_down(InputAction::Run) {
            self.config.run_speed
        } else {
            self.config.walk_speed
        };
        self.player.avatar_mut().set_speed(speed);

        let axis = |positive: InputAction, negative: InputAction| {
            let mut delta = 0.0;
            if input.is_down(positive) {
                delta += speed * dt;
            }
            if input.is_down(negative) {
                delta -= speed * dt;
            }
            delta
        };
        let dx = axis(InputAction::MoveRight, InputAction::MoveLeft);
        let dy = axis(InputAction::MoveDown, InputAction::MoveUp);

        if dx != 0.0 {
            let query = self.player.body().translated(dx, 0.0);
            if !self.is_blocked(query, report) {
                self.player.avatar_mut().translate(dx, 0.0);
            }
        }
        if dy != 0.0 {
            let query = self.player.body().translated(0.0, dy);
            if !self.is_blocked(query, report) {
                self.player.avatar_mut().translate(0.0, dy);
            }
        }

        let last_key_held = self
            .player
            .last_direction_key()
            .is_some_and(|direction| input.is_down(InputAction::for_direction(direction)));
        self.player
            .update_walk(dx, dy, last_key_held, dt, self.config.animation_timing());
    }

    fn is_blocked(&self, query: Rect, report: &mut TickReport) -> bool {
        let mut blocked = false;
        for collider in self.map.grid().colliders_near(query) {
            if self.debug {
                report.colliders.push(collider);
            }
            if collider.intersects(&query) {
                blocked = true;
                if !self.debug {
                    break;
                }
            }
        }
        blocked || self.map.npcs().any_body_intersects(&query)
    }

    fn bind_event(&mut self, index: usize) -> Option<EventSession> {
        let def = self.map.event(index)?.def.clone();
        info!(
            map = self.map.name(),
            event = def.name.as_str(),
            actions = def.actions.len(),
            "event_bound"
        );
        self.player.avatar_mut().set_speed(self.config.walk_speed);
        self.player.avatar_mut().animation_mut().reset();
        Some(EventSession {
            engine: EventEngine::new(def, index),
            dialogue: None,
        })
    }

    fn tick_transition(&mut self, mut state: TransitionState, dt: f32) -> GameMode {
        match state.phase {
            FadePhase::Out => {
                self.fade_alpha += self.config.fade_speed * dt;
                if self.fade_alpha >= 1.0 {
                    self.fade_alpha = 1.0;
                    match self.switch_map(&state.map, &state.spawn) {
                        Ok(()) => state.interrupted_event = None,
                        Err(err) => {
                            warn!(
                                map = state.map.as_str(),
                                spawn = state.spawn.as_str(),
                                error = %err,
                                "transition_failed"
                            );
                            self.stats.transitions_failed += 1;
                            self.last_load_error = Some(err.to_string());
                            self.blocked_transition = Some(state.area);
                        }
                    }
                    state.phase = FadePhase::In;
                }
                GameMode::Transitioning(state)
            }
            FadePhase::In => {
                self.fade_alpha -= self.config.fade_speed * dt;
                if self.fade_alpha > 0.0 {
                    return GameMode::Transitioning(state);
                }
                self.fade_alpha = 0.0;
                match state.interrupted_event {
                    Some(session) => GameMode::Event(session),
                    None => GameMode::Normal,
                }
            }
        }
    }

    /// Builds the new map fully before committing, so a failed load leaves
    /// the current map in place.
    fn switch_map(&mut self, map: &str, spawn: &str) -> Result<(), MapLoadError> {
        let data = self.provider.load_map(map)?;
        let state = MapState::build(&data, spawn, self.next_generation, &self.config)?;
        self.next_generation += 1;

        let player_spawn = state.player_spawn();
        let avatar = self.player.avatar_mut();
        avatar.set_position(player_spawn.position);
        if let Some(facing) = player_spawn.facing {
            avatar.set_facing(facing);
        }
        avatar.animation_mut().reset();

        info!(
            map = state.name(),
            spawn,
            generation = state.generation(),
            npcs = state.npcs().len(),
            events = state.events().len(),
            "map_loaded"
        );
        self.map = state;
        self.spawn = spawn.to_string();
        self.map_time = 0.0;
        self.blocked_transition = None;
        self.stats.maps_loaded += 1;
        Ok(())
    }

    fn tick_dialogue(
        &mut self,
        mut engine: DialogueEngine,
        input: &InputSnapshot,
        dt: f32,
    ) -> GameMode {
        if self.dialogue_input(&mut engine, input, dt) {
            GameMode::Dialogue(engine)
        } else {
            GameMode::Normal
        }
    }

    /// Applies confirm/skip and the reveal timer. Returns false once closed.
    fn dialogue_input(
        &mut self,
        engine: &mut DialogueEngine,
        input: &InputSnapshot,
        dt: f32,
    ) -> bool {
        if input.was_pressed(InputAction::Interact) {
            if engine.confirm() == DialogueProgress::Closed {
                self.close_dialogue(engine);
                return false;
            }
        } else if input.was_pressed(InputAction::Skip) {
            engine.skip();
        }
        engine.tick(dt);
        true
    }

    fn tick_event(
        &mut self,
        session: EventSession,
        input: &InputSnapshot,
        dt: f32,
        report: &mut TickReport,
    ) -> GameMode {
        let EventSession {
            mut engine,
            mut dialogue,
        } = session;

        if let Some(mut open) = dialogue.take() {
            if self.dialogue_input(&mut open, input, dt) {
                dialogue = Some(open);
            }
        }

        let mut ctx = ActionContext {
            player: &mut self.player,
            npcs: self.map.npcs_mut(),
            camera: &mut self.camera,
            config: &self.config,
            dt,
            dialogue_open: dialogue.is_some(),
            requests: Vec::new(),
            skipped_npcs: Vec::new(),
        };
        let progress = engine.tick(&mut ctx);
        let ActionContext {
            requests,
            skipped_npcs,
            ..
        } = ctx;

        let event_name = engine.event().name.clone();
        for npc in skipped_npcs {
            warn!(event = event_name.as_str(), npc = npc.as_str(), "event_action_skipped");
            self.stats.actions_skipped += 1;
            report.skipped_actions.push(SkippedAction {
                event: event_name.clone(),
                npc,
            });
        }

        for request in requests {
            match request {
                ActionRequest::OpenDialogue(name) => {
                    let Some(shared) = self.map.dialogue(&name).cloned() else {
                        warn!(
                            event = event_name.as_str(),
                            dialogue = name.as_str(),
                            "event_dialogue_missing"
                        );
                        continue;
                    };
                    if let Some(previous) = dialogue.take() {
                        self.close_dialogue(&previous);
                    }
                    dialogue = Some(self.open_dialogue(DialogueEngine::open(
                        shared,
                        None,
                        self.config.text_reveal_interval,
                    )));
                }
            }
        }

        if progress == EventProgress::Running {
            return GameMode::Event(EventSession { engine, dialogue });
        }

        self.map.mark_event_triggered(engine.event_index());
        self.stats.events_completed += 1;
        info!(map = self.map.name(), event = event_name.as_str(), "event_completed");
        match dialogue {
            Some(open) => GameMode::Dialogue(open),
            None => GameMode::Normal,
        }
    }

    fn frame(&self, report: TickReport) -> RenderableFrame {
        let dialogue = match &self.mode {
            GameMode::Dialogue(engine) => Some(engine.panel()),
            GameMode::Event(session) => session.dialogue.as_ref().map(DialogueEngine::panel),
            _ => None,
        };
        let debug = self.debug.then(|| self.debug_overlay(&report));
        RenderableFrame {
            map: self.map.name().to_string(),
            mode: self.mode.kind(),
            camera_target: self.camera.target,
            fade_alpha: self.fade_alpha,
            draw_list: build_draw_list(&self.map, &self.player, (self.map_time * 1000.0) as u64),
            dialogue,
            debug,
            skipped_actions: report.skipped_actions,
        }
    }

    fn debug_overlay(&self, report: &TickReport) -> DebugOverlay {
        let triggers = self.map.triggers();
        DebugOverlay {
            colliders: report.colliders.clone(),
            bodies: std::iter::once(self.player.body())
                .chain(self.map.npcs().iter().map(|npc| npc.body()))
                .collect(),
            interaction_zone: Some(
                report
                    .interaction_zone
                    .unwrap_or_else(|| self.player.interaction_zone()),
            ),
            triggers: triggers
                .transitions()
                .iter()
                .map(|trigger| trigger.area)
                .chain(triggers.dialogues().iter().map(|trigger| trigger.area))
                .chain(triggers.events().iter().map(|trigger| trigger.area))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::geometry::Vec2;
    use crate::app::map::test_maps::*;
    use crate::content::{ActionDef, EventDef, InMemoryMapProvider, MapData};

    const DT: f32 = 0.1;

    fn press(action: InputAction) -> InputSnapshot {
        InputSnapshot::empty().with_action_pressed(action)
    }

    fn hold(actions: &[InputAction]) -> InputSnapshot {
        actions
            .iter()
            .fold(InputSnapshot::empty(), |snapshot, &action| {
                snapshot.with_action_down(action, true)
            })
    }

    fn world(maps: Vec<MapData>, map: &str, spawn: &str) -> WorldSimulation {
        world_with(SimulationConfig::default(), maps, map, spawn)
    }

    fn world_with(
        config: SimulationConfig,
        maps: Vec<MapData>,
        map: &str,
        spawn: &str,
    ) -> WorldSimulation {
        let provider = maps
            .into_iter()
            .fold(InMemoryMapProvider::new(), InMemoryMapProvider::with_map);
        WorldSimulation::new(config, Box::new(provider), map, spawn).expect("world")
    }

    fn idle(sim: &mut WorldSimulation, ticks: usize) -> RenderableFrame {
        let mut frame = sim.advance(&InputSnapshot::empty(), DT);
        for _ in 1..ticks {
            frame = sim.advance(&InputSnapshot::empty(), DT);
        }
        frame
    }

    fn walled_room() -> MapData {
        // Column 2 is solid from top to bottom.
        let mut data = open_map("room", 4, 6);
        for row in 0..6 {
            data.collision.codes[row * 4 + 2] = 0;
        }
        data.spawn_points = vec![player_spawn("start", 0.0, 0.0)];
        data
    }

    #[test]
    fn blocked_axis_does_not_stop_the_other() {
        let mut sim = world(vec![walled_room()], "room", "start");
        let input = hold(&[InputAction::MoveRight, InputAction::MoveDown]);
        for _ in 0..3 {
            sim.advance(&input, DT);
        }
        assert_eq!(sim.player().position(), Vec2::new(15.0, 45.0));
        assert_eq!(sim.mode().kind(), ModeKind::Normal);
    }

    #[test]
    fn run_preset_and_npc_bodies_apply_to_free_roam() {
        let mut data = open_map("field", 10, 4);
        data.spawn_points = vec![
            player_spawn("start", 0.0, 0.0),
            npc_spawn("ada", 96.0, 8.0, None),
        ];
        let mut sim = world(vec![data], "field", "start");

        sim.advance(&hold(&[InputAction::MoveRight, InputAction::Run]), DT);
        assert_eq!(sim.player().position().x, 24.0);
        for _ in 0..5 {
            sim.advance(&hold(&[InputAction::MoveRight]), DT);
        }
        // Ada's body starts at x = 116; the player's body is 20 wide at +22.
        assert!(sim.player().body().right() <= 116.0);
        assert_eq!(sim.player().position().x, 69.0);
    }

    #[test]
    fn facing_follows_latest_held_direction() {
        let mut sim = world(vec![walled_room()], "room", "start");
        sim.advance(&press(InputAction::MoveDown), DT);
        let input = hold(&[InputAction::MoveDown]).with_action_pressed(InputAction::MoveRight);
        sim.advance(&input, DT);
        assert_eq!(sim.player().facing(), Direction::Right);
        sim.advance(&hold(&[InputAction::MoveDown]), DT);
        assert_eq!(sim.player().facing(), Direction::Down);
    }

    fn village() -> MapData {
        let mut data = open_map("village", 8, 8);
        data.spawn_points = vec![
            player_spawn("square", 64.0, 64.0),
            npc_spawn("ada", 64.0, 80.0, Some("greeting")),
        ];
        data.dialogues = vec![
            dialogue("greeting", &[("Ada", "Hi"), ("Ada", "Bye")]),
            dialogue("sign", &[("Sign", "North")]),
        ];
        data.dialogue_points = vec![dialogue_point(Rect::new(160.0, 0.0, 64.0, 64.0), "sign")];
        data
    }

    #[test]
    fn npc_dialogue_reveals_advances_and_restores_facing() {
        let mut sim = world(vec![village()], "village", "square");
        let frame = sim.advance(&press(InputAction::Interact), DT);
        assert_eq!(frame.mode, ModeKind::Dialogue);
        let handle = sim.map().npcs().resolve("ada").expect("ada");
        let ada = |sim: &WorldSimulation| sim.map().npcs().get(handle).expect("npc").avatar().facing();
        assert_eq!(ada(&sim), Direction::Up);

        let frame = sim.advance(&InputSnapshot::empty(), 0.03);
        let panel = frame.dialogue.expect("panel");
        assert_eq!((panel.speaker.as_str(), panel.visible_text.as_str()), ("Ada", "H"));

        let frame = sim.advance(&press(InputAction::Skip), 0.0);
        assert!(frame.dialogue.expect("panel").line_finished);
        let frame = sim.advance(&press(InputAction::Interact), 0.0);
        let panel = frame.dialogue.expect("panel");
        assert_eq!((panel.line_index, panel.visible_text.as_str()), (1, ""));

        sim.advance(&press(InputAction::Interact), 0.0);
        let frame = sim.advance(&press(InputAction::Interact), 0.0);
        assert_eq!(frame.mode, ModeKind::Normal);
        assert!(frame.dialogue.is_none());
        assert_eq!(ada(&sim), Direction::Left);
        assert_eq!(sim.stats().dialogues_opened, 1);
    }

    #[test]
    fn dialogue_points_win_over_npcs() {
        let mut data = village();
        data.dialogue_points = vec![dialogue_point(Rect::new(64.0, 64.0, 64.0, 64.0), "sign")];
        let mut sim = world(vec![data], "village", "square");
        let frame = sim.advance(&press(InputAction::Interact), DT);
        assert_eq!(frame.dialogue.expect("panel").dialogue, "sign");
    }

    #[test]
    fn interacting_with_nothing_keeps_roaming() {
        let mut data = village();
        data.spawn_points.truncate(1);
        let mut sim = world(vec![data], "village", "square");
        let frame = sim.advance(&press(InputAction::Interact), DT);
        assert_eq!(frame.mode, ModeKind::Normal);
    }

    fn evented_village(actions: Vec<ActionDef>) -> MapData {
        let mut data = village();
        data.events = vec![EventDef {
            name: "welcome".to_string(),
            actions,
        }];
        data.event_points = vec![event_point(Rect::new(64.0, 64.0, 64.0, 64.0), "welcome")];
        data
    }

    fn run_until_not(sim: &mut WorldSimulation, kind: ModeKind) -> usize {
        let mut ticks = 0;
        while sim.mode().kind() == kind {
            sim.advance(&InputSnapshot::empty(), DT);
            ticks += 1;
            assert!(ticks < 500, "stuck in {kind:?}");
        }
        ticks
    }

    #[test]
    fn events_run_once_and_reset_on_reload() {
        let data = evented_village(vec![ActionDef::MoveNpc {
            npc: "ada".to_string(),
            tiles: 1,
            direction: Direction::Right,
            follow: false,
        }]);
        let mut sim = world(vec![data], "village", "square");

        assert_eq!(idle(&mut sim, 1).mode, ModeKind::Event);
        run_until_not(&mut sim, ModeKind::Event);
        assert_eq!(sim.mode().kind(), ModeKind::Normal);
        assert!(sim.map().is_event_triggered(0));
        let handle = sim.map().npcs().resolve("ada").expect("ada");
        let x = sim.map().npcs().get(handle).expect("npc").avatar().position().x;
        assert!((96.0 - x).abs() <= 1.0);

        assert_eq!(idle(&mut sim, 3).mode, ModeKind::Normal);
        assert_eq!(sim.stats().events_completed, 1);

        sim.reload().expect("reload");
        assert!(!sim.map().is_event_triggered(0));
        assert_eq!(idle(&mut sim, 1).mode, ModeKind::Event);
    }

    #[test]
    fn event_camera_is_not_pulled_back_to_the_player() {
        let data = evented_village(vec![ActionDef::MoveCamera {
            tiles: 2,
            direction: Direction::Up,
            speed: 320.0,
        }]);
        let mut sim = world(vec![data], "village", "square");
        let start = sim.camera().target;
        idle(&mut sim, 3);
        assert_eq!(sim.mode().kind(), ModeKind::Event);
        assert_eq!(sim.camera().target, Vec2::new(start.x, start.y - 64.0));
        idle(&mut sim, 1);
        assert_eq!(sim.mode().kind(), ModeKind::Normal);
        assert_eq!(sim.camera().target, start);
    }

    #[test]
    fn event_dialogue_does_not_hold_the_cursor() {
        let data = evented_village(vec![
            ActionDef::Dialogue {
                dialogue: "sign".to_string(),
            },
            ActionDef::MovePlayer {
                tiles: 1,
                direction: Direction::Up,
                follow: true,
            },
        ]);
        let mut sim = world(vec![data], "village", "square");

        idle(&mut sim, 1);
        let frame = idle(&mut sim, 1);
        assert_eq!(frame.mode, ModeKind::Event);
        assert_eq!(frame.dialogue.expect("panel").dialogue, "sign");
        assert_eq!(sim.player().position().y, 64.0);
        idle(&mut sim, 1);
        assert!(sim.player().position().y < 64.0);

        run_until_not(&mut sim, ModeKind::Event);
        assert_eq!(sim.mode().kind(), ModeKind::Dialogue);
        assert!((sim.player().position().y - 32.0).abs() <= 1.0);
    }

    #[test]
    fn awaited_event_dialogue_blocks_until_closed() {
        let data = evented_village(vec![
            ActionDef::Dialogue {
                dialogue: "sign".to_string(),
            },
            ActionDef::MovePlayer {
                tiles: 1,
                direction: Direction::Up,
                follow: false,
            },
        ]);
        let config = SimulationConfig {
            await_event_dialogues: true,
            ..SimulationConfig::default()
        };
        let mut sim = world_with(config, vec![data], "village", "square");

        idle(&mut sim, 5);
        assert_eq!(sim.player().position().y, 64.0);
        sim.advance(&press(InputAction::Interact), DT);
        let frame = sim.advance(&press(InputAction::Interact), DT);
        assert!(frame.dialogue.is_none());
        assert_eq!(frame.mode, ModeKind::Event);
        idle(&mut sim, 1);
        assert!(sim.player().position().y < 64.0);
    }

    fn linked_maps() -> Vec<MapData> {
        let mut town = open_map("town", 6, 6);
        town.spawn_points = vec![player_spawn("start", 32.0, 32.0)];
        town.transitions = vec![transition(Rect::new(96.0, 40.0, 32.0, 32.0), "cave", "entry")];

        let mut cave = open_map("cave", 5, 5);
        cave.spawn_points = vec![
            player_spawn("entry", 64.0, 96.0),
            npc_spawn("bat", 0.0, 0.0, None),
        ];
        vec![town, cave]
    }

    #[test]
    fn transition_fades_and_repopulates_from_named_spawn() {
        let mut sim = world(linked_maps(), "town", "start");
        let generation = sim.map().generation();
        let right = hold(&[InputAction::MoveRight]);
        let mut ticks = 0;
        while sim.mode().kind() == ModeKind::Normal {
            sim.advance(&right, DT);
            ticks += 1;
            assert!(ticks < 20, "never reached the transition");
        }

        let mut alphas = Vec::new();
        while sim.map().name() == "town" {
            alphas.push(sim.advance(&right, 0.25).fade_alpha);
        }
        assert_eq!(alphas, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(sim.player().position(), Vec2::new(64.0, 96.0));
        assert!(sim.map().generation() > generation);
        assert_eq!(sim.map().npcs().len(), 1);

        for _ in 0..3 {
            let frame = sim.advance(&InputSnapshot::empty(), 0.25);
            assert_eq!(frame.mode, ModeKind::Transitioning);
        }
        let frame = sim.advance(&InputSnapshot::empty(), 0.25);
        assert_eq!(frame.mode, ModeKind::Normal);
        assert_eq!(frame.fade_alpha, 0.0);
        assert_eq!(sim.stats().maps_loaded, 2);
    }

    #[test]
    fn failed_transition_keeps_the_current_map() {
        let mut maps = linked_maps();
        maps[1].spawn_points.remove(0);
        let mut sim = world(maps, "town", "start");
        let right = hold(&[InputAction::MoveRight]);
        while sim.mode().kind() == ModeKind::Normal {
            sim.advance(&right, DT);
        }
        let position = sim.player().position();
        run_until_not(&mut sim, ModeKind::Transitioning);

        assert_eq!(sim.map().name(), "town");
        assert_eq!(sim.player().position(), position);
        assert_eq!(sim.stats().transitions_failed, 1);
        assert!(sim
            .last_load_error()
            .expect("error")
            .contains("no player spawn point named 'entry'"));

        // Standing in the failed area does not retrigger it.
        idle(&mut sim, 3);
        assert_eq!(sim.mode().kind(), ModeKind::Normal);
    }

    #[test]
    fn transition_and_event_on_the_same_tick() {
        let mut maps = linked_maps();
        maps[0].events = vec![EventDef {
            name: "spooked".to_string(),
            actions: vec![ActionDef::MovePlayer {
                tiles: 1,
                direction: Direction::Left,
                follow: false,
            }],
        }];
        maps[0].event_points = vec![event_point(Rect::new(96.0, 40.0, 32.0, 32.0), "spooked")];
        maps[1].spawn_points.remove(0);
        let mut sim = world(maps, "town", "start");

        let right = hold(&[InputAction::MoveRight]);
        while sim.mode().kind() == ModeKind::Normal {
            sim.advance(&right, DT);
        }
        assert!(matches!(
            sim.mode(),
            GameMode::Transitioning(TransitionState {
                interrupted_event: Some(_),
                ..
            })
        ));
        run_until_not(&mut sim, ModeKind::Transitioning);
        assert_eq!(sim.mode().kind(), ModeKind::Event);
        run_until_not(&mut sim, ModeKind::Event);
        assert!(sim.map().is_event_triggered(0));
    }

    #[test]
    fn unknown_start_map_is_an_error() {
        let provider = InMemoryMapProvider::new();
        let result = WorldSimulation::new(
            SimulationConfig::default(),
            Box::new(provider),
            "nowhere",
            "start",
        );
        assert!(matches!(result, Err(MapLoadError::Content(_))));
    }

    #[test]
    fn debug_overlay_lists_examined_colliders() {
        let mut sim = world(vec![walled_room()], "room", "start");
        let frame = sim.advance(&hold(&[InputAction::MoveRight]), DT);
        assert!(frame.debug.is_none());

        let input = hold(&[InputAction::MoveRight]).with_action_pressed(InputAction::ToggleDebug);
        let frame = sim.advance(&input, DT);
        let overlay = frame.debug.expect("overlay");
        assert!(overlay.colliders.contains(&Rect::new(64.0, 0.0, 32.0, 32.0)));
        assert_eq!(overlay.bodies.len(), 1);
        assert!(overlay.interaction_zone.is_some());
    }
}
