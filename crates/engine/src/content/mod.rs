mod file_provider;
mod grid_csv;
mod json;
mod provider;
mod tiled;
mod types;

pub use file_provider::FileMapProvider;
pub use grid_csv::parse_collision_csv;
pub use json::{parse_json, read_json_file};
pub use provider::{InMemoryMapProvider, MapDataProvider};
pub use tiled::{parse_tiled_map, TiledContents};
pub use types::{
    ActionDef, CollisionData, ContentError, DialogueDef, DialoguePointData, DialoguesDocument,
    EventDef, EventPointData, EventsDocument, MapData, SentenceDef, SpawnOwner, SpawnPointData,
    TileAnimationFrame, TileLayerData, TilesetData, TransitionData, WorldObjectData,
};
