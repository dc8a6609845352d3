use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{Direction, Rect, Vec2};

/// Everything needed to build one map, independent of the on-disk format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapData {
    pub name: String,
    pub tilesets: Vec<TilesetData>,
    pub tile_layers: Vec<TileLayerData>,
    pub collision: CollisionData,
    pub world_objects: Vec<WorldObjectData>,
    pub transitions: Vec<TransitionData>,
    pub spawn_points: Vec<SpawnPointData>,
    pub dialogue_points: Vec<DialoguePointData>,
    pub event_points: Vec<EventPointData>,
    pub dialogues: Vec<DialogueDef>,
    pub events: Vec<EventDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilesetData {
    pub first_gid: u32,
    pub columns: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Animated tiles by local tile id.
    pub animations: BTreeMap<u32, Vec<TileAnimationFrame>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAnimationFrame {
    pub tile_id: u32,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayerData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Row-major gids, 0 for an empty cell.
    pub data: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionData {
    pub width: u32,
    pub height: u32,
    pub codes: Vec<i32>,
}

/// Multi-tile sprite anchored at `(tile_x, tile_y)` of `layer`. Offsets are
/// inclusive and relative to the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldObjectData {
    pub tile_x: i32,
    pub tile_y: i32,
    pub layer: String,
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionData {
    pub area: Rect,
    pub map: String,
    pub spawn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOwner {
    Player,
    Npc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPointData {
    pub owner: SpawnOwner,
    pub name: String,
    pub facing: Option<Direction>,
    pub position: Vec2,
    pub dialogue: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialoguePointData {
    pub area: Rect,
    pub dialogue: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventPointData {
    pub area: Rect,
    pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialoguesDocument {
    #[serde(default)]
    pub dialogues: Vec<DialogueDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueDef {
    pub name: String,
    pub sentences: Vec<SentenceDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceDef {
    pub speaker: String,
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsDocument {
    #[serde(default)]
    pub events: Vec<EventDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    pub actions: Vec<ActionDef>,
}

/// Authored event action. Unknown `type` tags fail deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionDef {
    #[serde(rename = "ACTION_DIALOGUE")]
    Dialogue { dialogue: String },
    #[serde(rename = "ACTION_MOVE_NPC")]
    MoveNpc {
        npc: String,
        tiles: u32,
        direction: Direction,
        #[serde(default)]
        follow: bool,
    },
    #[serde(rename = "ACTION_MOVE_PLAYER")]
    MovePlayer {
        tiles: u32,
        direction: Direction,
        #[serde(default)]
        follow: bool,
    },
    #[serde(rename = "ACTION_MOVE_CAMERA")]
    MoveCamera {
        tiles: u32,
        direction: Direction,
        speed: f32,
    },
    #[serde(rename = "ACTION_GROUP")]
    Group { actions: Vec<ActionDef> },
}

impl ActionDef {
    /// Depth-first walk over this action and every nested child.
    pub fn visit(&self, visitor: &mut impl FnMut(&ActionDef)) {
        visitor(self);
        if let ActionDef::Group { actions } = self {
            for action in actions {
                action.visit(visitor);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("map '{name}' was not found")]
    MapNotFound { name: String },
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at {json_path}: {source}")]
    Json {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid collision grid {path} line {line}: {message}")]
    Csv {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("invalid map data in {path}: {message}")]
    InvalidMap { path: PathBuf, message: String },
}
