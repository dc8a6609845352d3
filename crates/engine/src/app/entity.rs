use std::sync::Arc;

use super::dialogue::Dialogue;
use super::geometry::{Direction, Rect, Vec2};

const INTERACTION_DEPTH: f32 = 10.0;
const VERTICAL_INTERACTION_EXTRA: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTiming {
    pub frame_seconds: f32,
    pub frame_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WalkAnimation {
    frame: u32,
    timer: f32,
}

impl WalkAnimation {
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn advance(&mut self, dt: f32, timing: AnimationTiming) {
        self.timer += dt;
        if self.timer >= timing.frame_seconds {
            self.timer -= timing.frame_seconds;
            self.frame = (self.frame + 1) % timing.frame_count.max(1);
        }
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.timer = 0.0;
    }
}

/// Collision body as an offset sub-rectangle of the sprite cell. Only the
/// feet collide, not the full sprite box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyShape {
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
}

impl BodyShape {
    pub fn at(&self, position: Vec2) -> Rect {
        Rect::new(
            position.x + self.offset_x,
            position.y + self.offset_y,
            self.width,
            self.height,
        )
    }
}

pub const PLAYER_BODY: BodyShape = BodyShape {
    offset_x: 22.0,
    offset_y: 25.0,
    width: 20.0,
    height: 8.0,
};

pub const NPC_BODY: BodyShape = BodyShape {
    offset_x: 20.0,
    offset_y: 17.0,
    width: 24.0,
    height: 16.0,
};

/// State shared by everything that walks: position, facing, walk cycle and
/// the body derived from position.
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    position: Vec2,
    facing: Direction,
    animation: WalkAnimation,
    speed: f32,
    shape: BodyShape,
    body: Rect,
}

impl Avatar {
    pub fn new(position: Vec2, facing: Direction, speed: f32, shape: BodyShape) -> Self {
        Self {
            position,
            facing,
            animation: WalkAnimation::default(),
            speed,
            shape,
            body: shape.at(position),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.body = self.shape.at(position);
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.set_position(Vec2::new(self.position.x + dx, self.position.y + dy));
    }

    pub fn body(&self) -> Rect {
        self.body
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Direction) {
        self.facing = facing;
    }

    pub fn animation(&self) -> &WalkAnimation {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut WalkAnimation {
        &mut self.animation
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    avatar: Avatar,
    last_direction_key: Option<Direction>,
}

impl Player {
    pub fn new(position: Vec2, facing: Direction, speed: f32) -> Self {
        Self {
            avatar: Avatar::new(position, facing, speed, PLAYER_BODY),
            last_direction_key: None,
        }
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    pub fn position(&self) -> Vec2 {
        self.avatar.position()
    }

    pub fn body(&self) -> Rect {
        self.avatar.body()
    }

    pub fn facing(&self) -> Direction {
        self.avatar.facing()
    }

    pub fn last_direction_key(&self) -> Option<Direction> {
        self.last_direction_key
    }

    pub fn remember_direction_key(&mut self, direction: Direction) {
        self.last_direction_key = Some(direction);
    }

    /// Thin probe rectangle projecting from the body edge the player faces.
    pub fn interaction_zone(&self) -> Rect {
        let body = self.body();
        let vertical_depth = INTERACTION_DEPTH + VERTICAL_INTERACTION_EXTRA;
        match self.facing() {
            Direction::Down => Rect::new(body.x, body.bottom(), body.width, vertical_depth),
            Direction::Up => Rect::new(body.x, body.y - vertical_depth, body.width, vertical_depth),
            Direction::Right => Rect::new(
                body.x + INTERACTION_DEPTH,
                body.y,
                body.width,
                INTERACTION_DEPTH,
            ),
            Direction::Left => Rect::new(
                body.x - INTERACTION_DEPTH,
                body.y,
                body.width,
                INTERACTION_DEPTH,
            ),
        }
    }

    /// Free-roam facing and walk cycle for a frame with motion intent
    /// `(dx, dy)`. Intent drives the animation even when motion was blocked.
    pub fn update_walk(
        &mut self,
        dx: f32,
        dy: f32,
        last_key_held: bool,
        dt: f32,
        timing: AnimationTiming,
    ) {
        if dx == 0.0 && dy == 0.0 {
            self.avatar.animation_mut().reset();
            return;
        }
        let facing = resolve_walk_facing(
            self.avatar.facing(),
            self.last_direction_key,
            last_key_held,
            dx,
            dy,
        );
        self.avatar.set_facing(facing);
        self.avatar.animation_mut().advance(dt, timing);
    }
}

/// The latest direction key wins while it is held. Once released, the facing
/// follows whatever motion remains, preferring the perpendicular axis.
fn resolve_walk_facing(
    current: Direction,
    last_key: Option<Direction>,
    last_key_held: bool,
    dx: f32,
    dy: f32,
) -> Direction {
    let Some(last_key) = last_key else {
        return current;
    };
    if last_key_held {
        return last_key;
    }
    if last_key.is_horizontal() {
        if dy != 0.0 {
            Direction::vertical_from(dy)
        } else {
            Direction::horizontal_from(dx)
        }
    } else if dx != 0.0 {
        Direction::horizontal_from(dx)
    } else {
        Direction::vertical_from(dy)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    name: String,
    avatar: Avatar,
    default_facing: Direction,
    dialogue: Option<Arc<Dialogue>>,
}

impl Npc {
    pub fn new(
        name: impl Into<String>,
        position: Vec2,
        facing: Direction,
        speed: f32,
        dialogue: Option<Arc<Dialogue>>,
    ) -> Self {
        Self {
            name: name.into(),
            avatar: Avatar::new(position, facing, speed, NPC_BODY),
            default_facing: facing,
            dialogue,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    pub fn body(&self) -> Rect {
        self.avatar.body()
    }

    pub fn default_facing(&self) -> Direction {
        self.default_facing
    }

    pub fn restore_default_facing(&mut self) {
        self.avatar.set_facing(self.default_facing);
    }

    pub fn dialogue(&self) -> Option<&Arc<Dialogue>> {
        self.dialogue.as_ref()
    }
}

/// Non-owning reference to an NPC of one specific map load. A handle from an
/// older load never resolves against a newer roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NpcHandle {
    pub generation: u64,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NpcRoster {
    generation: u64,
    npcs: Vec<Npc>,
}

impl NpcRoster {
    pub fn new(generation: u64, npcs: Vec<Npc>) -> Self {
        Self { generation, npcs }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.iter()
    }

    pub fn handles(&self) -> impl Iterator<Item = (NpcHandle, &Npc)> {
        let generation = self.generation;
        self.npcs
            .iter()
            .enumerate()
            .map(move |(index, npc)| (NpcHandle { generation, index }, npc))
    }

    pub fn resolve(&self, name: &str) -> Option<NpcHandle> {
        self.npcs
            .iter()
            .position(|npc| npc.name == name)
            .map(|index| NpcHandle {
                generation: self.generation,
                index,
            })
    }

    pub fn get(&self, handle: NpcHandle) -> Option<&Npc> {
        if handle.generation != self.generation {
            return None;
        }
        self.npcs.get(handle.index)
    }

    pub fn get_mut(&mut self, handle: NpcHandle) -> Option<&mut Npc> {
        if handle.generation != self.generation {
            return None;
        }
        self.npcs.get_mut(handle.index)
    }

    pub fn any_body_intersects(&self, rect: &Rect) -> bool {
        self.npcs.iter().any(|npc| npc.body().intersects(rect))
    }
}
