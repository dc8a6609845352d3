use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn floor(self) -> Self {
        Self {
            x: self.x.floor(),
            y: self.y.floor(),
        }
    }
}

/// Axis-aligned rectangle in world pixels. `(x, y)` is the top-left corner and
/// y grows downward, matching tile row order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// +1 for directions that grow the coordinate (RIGHT, DOWN), -1 otherwise.
    pub fn sign(self) -> f32 {
        match self {
            Self::Right | Self::Down => 1.0,
            Self::Left | Self::Up => -1.0,
        }
    }

    /// Row of the walk cycle for this facing in a character sprite sheet.
    pub fn sprite_row(self) -> u32 {
        match self {
            Self::Up => 8,
            Self::Left => 9,
            Self::Down => 10,
            Self::Right => 11,
        }
    }

    pub fn from_frame_token(token: &str) -> Option<Self> {
        match token {
            "FRAME_UP" => Some(Self::Up),
            "FRAME_DOWN" => Some(Self::Down),
            "FRAME_LEFT" => Some(Self::Left),
            "FRAME_RIGHT" => Some(Self::Right),
            _ => None,
        }
    }

    pub(crate) fn horizontal_from(dx: f32) -> Self {
        if dx > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub(crate) fn vertical_from(dy: f32) -> Self {
        if dy > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

/// Read the coordinate that motion along `direction` changes.
pub(crate) fn axis_value(position: Vec2, direction: Direction) -> f32 {
    if direction.is_horizontal() {
        position.x
    } else {
        position.y
    }
}

pub(crate) fn with_axis_value(position: Vec2, direction: Direction, value: f32) -> Vec2 {
    if direction.is_horizontal() {
        Vec2 { x: value, ..position }
    } else {
        Vec2 { y: value, ..position }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub target: Vec2,
}

impl Camera2D {
    /// Center on the middle of the tile-sized cell at `position`, floored so
    /// the camera and floored sprites never disagree by a sub-pixel.
    pub fn center_on(&mut self, position: Vec2, tile_size: f32) {
        let half = tile_size / 2.0;
        self.target = Vec2 {
            x: position.x + half,
            y: position.y + half,
        }
        .floor();
    }
}
