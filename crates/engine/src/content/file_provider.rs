use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::grid_csv::parse_collision_csv;
use super::json::parse_json;
use super::provider::MapDataProvider;
use super::tiled::parse_tiled_map;
use super::types::{ContentError, DialoguesDocument, EventsDocument, MapData};

/// Reads maps laid out as `<map>.tmj`, `<map>_collisions.csv` and the
/// optional `<map>_dialogues.json` / `<map>_events.json` in one directory.
#[derive(Debug, Clone)]
pub struct FileMapProvider {
    asset_dir: PathBuf,
}

impl FileMapProvider {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    fn map_path(&self, name: &str, suffix: &str) -> PathBuf {
        self.asset_dir.join(format!("{name}{suffix}"))
    }
}

impl MapDataProvider for FileMapProvider {
    fn load_map(&self, name: &str) -> Result<MapData, ContentError> {
        let tmj_path = self.map_path(name, ".tmj");
        let tmj_raw = match fs::read_to_string(&tmj_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::MapNotFound {
                    name: name.to_string(),
                });
            }
            Err(source) => {
                return Err(ContentError::ReadFile {
                    path: tmj_path,
                    source,
                })
            }
        };
        let tiled = parse_tiled_map(&tmj_path, &tmj_raw)?;

        let csv_path = self.map_path(name, "_collisions.csv");
        let csv_raw = read_required(&csv_path)?;
        let collision = parse_collision_csv(&csv_path, &csv_raw)?;

        let dialogues_path = self.map_path(name, "_dialogues.json");
        let dialogues = match read_optional(&dialogues_path)? {
            Some(raw) => parse_json::<DialoguesDocument>(&dialogues_path, &raw)?.dialogues,
            None => Vec::new(),
        };

        let events_path = self.map_path(name, "_events.json");
        let events = match read_optional(&events_path)? {
            Some(raw) => parse_json::<EventsDocument>(&events_path, &raw)?.events,
            None => Vec::new(),
        };

        debug!(
            map = name,
            layers = tiled.tile_layers.len(),
            dialogues = dialogues.len(),
            events = events.len(),
            "map_files_read"
        );

        Ok(MapData {
            name: name.to_string(),
            tilesets: tiled.tilesets,
            tile_layers: tiled.tile_layers,
            collision,
            world_objects: tiled.world_objects,
            transitions: tiled.transitions,
            spawn_points: tiled.spawn_points,
            dialogue_points: tiled.dialogue_points,
            event_points: tiled.event_points,
            dialogues,
            events,
        })
    }
}

fn read_required(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional(path: &Path) -> Result<Option<String>, ContentError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ContentError::ReadFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}
