use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::json::{parse_json, read_json_file};
use super::types::{
    ContentError, DialoguePointData, EventPointData, SpawnOwner, SpawnPointData,
    TileAnimationFrame, TileLayerData, TilesetData, TransitionData, WorldObjectData,
};
use crate::app::{Direction, Rect, Vec2};

pub const LAYER_COLLISIONS: &str = "Collisions";
pub const LAYER_WORLD_OBJECTS: &str = "WorldObjects";
pub const LAYER_TRANSITIONS: &str = "Transitions";
pub const LAYER_SPAWN_POINTS: &str = "SpawnPoints";
pub const LAYER_DIALOGUES: &str = "Dialogues";
pub const LAYER_EVENTS: &str = "Events";

/// Objects are authored on a 16 px grid and rendered on a 32 px one.
const AUTHORING_SCALE: f32 = 2.0;
const AUTHORING_TILE_PX: f32 = 16.0;

#[derive(Debug, Deserialize)]
struct TiledMap {
    #[serde(default)]
    tilesets: Vec<TiledTilesetRef>,
    layers: Vec<TiledLayer>,
}

#[derive(Debug, Deserialize)]
struct TiledTilesetRef {
    firstgid: u32,
    source: Option<String>,
    columns: Option<u32>,
    tilewidth: Option<u32>,
    tileheight: Option<u32>,
    #[serde(default)]
    tiles: Vec<TiledTile>,
}

#[derive(Debug, Deserialize)]
struct TiledTileset {
    columns: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    tiles: Vec<TiledTile>,
}

#[derive(Debug, Deserialize)]
struct TiledTile {
    id: u32,
    #[serde(default)]
    animation: Vec<TiledFrame>,
}

#[derive(Debug, Deserialize)]
struct TiledFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TiledLayer {
    TileLayer(TiledTileLayer),
    ObjectGroup(TiledObjectGroup),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TiledTileLayer {
    name: String,
    width: u32,
    height: u32,
    data: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct TiledObjectGroup {
    name: String,
    #[serde(default)]
    objects: Vec<TiledObject>,
}

#[derive(Debug, Deserialize)]
struct TiledObject {
    x: f32,
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    properties: Option<Vec<TiledProperty>>,
}

#[derive(Debug, Deserialize)]
struct TiledProperty {
    name: String,
    value: Value,
}

/// Geometry and object layers of one Tiled map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TiledContents {
    pub tilesets: Vec<TilesetData>,
    pub tile_layers: Vec<TileLayerData>,
    pub world_objects: Vec<WorldObjectData>,
    pub transitions: Vec<TransitionData>,
    pub spawn_points: Vec<SpawnPointData>,
    pub dialogue_points: Vec<DialoguePointData>,
    pub event_points: Vec<EventPointData>,
}

/// Parses a `.tmj` document. External `.tsj` tilesets are resolved relative
/// to the directory holding `path`.
pub fn parse_tiled_map(path: &Path, raw: &str) -> Result<TiledContents, ContentError> {
    let map: TiledMap = parse_json(path, raw)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut contents = TiledContents::default();

    for tileset in map.tilesets {
        contents.tilesets.push(resolve_tileset(path, base_dir, tileset)?);
    }

    for layer in map.layers {
        match layer {
            TiledLayer::TileLayer(layer) => {
                if layer.name == LAYER_COLLISIONS {
                    continue;
                }
                contents.tile_layers.push(TileLayerData {
                    name: layer.name,
                    width: layer.width,
                    height: layer.height,
                    data: layer.data,
                });
            }
            TiledLayer::ObjectGroup(group) => read_object_group(path, group, &mut contents)?,
            TiledLayer::Other => {}
        }
    }

    Ok(contents)
}

fn resolve_tileset(
    path: &Path,
    base_dir: &Path,
    tileset: TiledTilesetRef,
) -> Result<TilesetData, ContentError> {
    let resolved = match &tileset.source {
        Some(source) => read_json_file::<TiledTileset>(&base_dir.join(source))?,
        None => {
            let missing = |field: &str| ContentError::InvalidMap {
                path: path.to_path_buf(),
                message: format!(
                    "inline tileset with firstgid {} has no '{field}'",
                    tileset.firstgid
                ),
            };
            TiledTileset {
                columns: tileset.columns.ok_or_else(|| missing("columns"))?,
                tilewidth: tileset.tilewidth.ok_or_else(|| missing("tilewidth"))?,
                tileheight: tileset.tileheight.ok_or_else(|| missing("tileheight"))?,
                tiles: tileset.tiles,
            }
        }
    };

    let mut animations = BTreeMap::new();
    for tile in resolved.tiles {
        if tile.animation.is_empty() {
            continue;
        }
        let frames = tile
            .animation
            .into_iter()
            .map(|frame| TileAnimationFrame {
                tile_id: frame.tileid,
                duration_ms: frame.duration,
            })
            .collect();
        animations.insert(tile.id, frames);
    }

    Ok(TilesetData {
        first_gid: tileset.firstgid,
        columns: resolved.columns,
        tile_width: resolved.tilewidth,
        tile_height: resolved.tileheight,
        animations,
    })
}

fn read_object_group(
    path: &Path,
    group: TiledObjectGroup,
    contents: &mut TiledContents,
) -> Result<(), ContentError> {
    for object in &group.objects {
        let Some(properties) = &object.properties else {
            continue;
        };
        let props = Properties {
            path,
            layer: &group.name,
            object,
            properties,
        };
        match group.name.as_str() {
            LAYER_WORLD_OBJECTS => contents.world_objects.push(WorldObjectData {
                tile_x: (object.x / AUTHORING_TILE_PX).floor() as i32,
                tile_y: (object.y / AUTHORING_TILE_PX).floor() as i32,
                layer: props.string("layer")?,
                start_x: props.int("startX")?,
                start_y: props.int("startY")?,
                end_x: props.int("endX")?,
                end_y: props.int("endY")?,
            }),
            LAYER_TRANSITIONS => contents.transitions.push(TransitionData {
                area: object_area(object),
                map: props.string("map")?,
                spawn: props.string("spawnName")?,
            }),
            LAYER_SPAWN_POINTS => contents.spawn_points.push(read_spawn_point(&props)?),
            LAYER_DIALOGUES => contents.dialogue_points.push(DialoguePointData {
                area: object_area(object),
                dialogue: props.string("src")?,
            }),
            LAYER_EVENTS => contents.event_points.push(EventPointData {
                area: object_area(object),
                event: props.string("event")?,
            }),
            _ => {}
        }
    }
    Ok(())
}

fn read_spawn_point(props: &Properties<'_>) -> Result<SpawnPointData, ContentError> {
    let owner = match props.string("who")?.as_str() {
        "player" => SpawnOwner::Player,
        "npc" => SpawnOwner::Npc,
        other => return Err(props.invalid(format!("unknown spawn owner '{other}'"))),
    };
    let facing = match props.optional_string("frame")? {
        Some(token) => Some(
            Direction::from_frame_token(&token)
                .ok_or_else(|| props.invalid(format!("unknown frame '{token}'")))?,
        ),
        None => None,
    };
    Ok(SpawnPointData {
        owner,
        name: props.string("name")?,
        facing,
        position: Vec2::new(
            props.object.x * AUTHORING_SCALE,
            props.object.y * AUTHORING_SCALE,
        ),
        dialogue: props.optional_string("dialogue")?,
    })
}

fn object_area(object: &TiledObject) -> Rect {
    Rect::new(object.x, object.y, object.width, object.height).scaled(AUTHORING_SCALE)
}

struct Properties<'a> {
    path: &'a Path,
    layer: &'a str,
    object: &'a TiledObject,
    properties: &'a [TiledProperty],
}

impl Properties<'_> {
    fn find(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| &property.value)
    }

    fn optional_string(&self, name: &str) -> Result<Option<String>, ContentError> {
        match self.find(name) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(self.invalid(format!("property '{name}' must be a string, got {other}"))),
        }
    }

    fn string(&self, name: &str) -> Result<String, ContentError> {
        self.optional_string(name)?
            .ok_or_else(|| self.invalid(format!("missing property '{name}'")))
    }

    fn int(&self, name: &str) -> Result<i32, ContentError> {
        let value = self
            .find(name)
            .ok_or_else(|| self.invalid(format!("missing property '{name}'")))?;
        value
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| self.invalid(format!("property '{name}' must be an integer, got {value}")))
    }

    fn invalid(&self, message: String) -> ContentError {
        ContentError::InvalidMap {
            path: self.path.to_path_buf(),
            message: format!(
                "{} object at ({}, {}): {message}",
                self.layer, self.object.x, self.object.y
            ),
        }
    }
}
