use crate::content::{TileLayerData, TilesetData, WorldObjectData};

use super::geometry::Vec2;
use super::map::MapLoadError;

pub const LAYER_DRAWABLES: &str = "Drawables";
pub const LAYER_ALWAYS_ABOVE: &str = "AlwaysAbove";
const LAYER_COLLISIONS: &str = "Collisions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrawPass {
    Ground,
    Sorted,
    Above,
}

impl DrawPass {
    fn for_layer(name: &str) -> Self {
        match name {
            LAYER_DRAWABLES => DrawPass::Sorted,
            LAYER_ALWAYS_ABOVE => DrawPass::Above,
            _ => DrawPass::Ground,
        }
    }
}

/// One non-empty map cell with its resolved tileset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub tileset: usize,
    pub local_id: u32,
    pub position: Vec2,
    pub sort_y: f32,
}

/// Static tiles of a map grouped by draw pass, in layer then row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenery {
    tilesets: Vec<TilesetData>,
    ground: Vec<PlacedTile>,
    sorted: Vec<PlacedTile>,
    above: Vec<PlacedTile>,
}

impl Scenery {
    pub fn build(
        map: &str,
        tilesets: &[TilesetData],
        layers: &[TileLayerData],
        world_objects: &[WorldObjectData],
        tile_size: f32,
    ) -> Result<Self, MapLoadError> {
        let mut tilesets = tilesets.to_vec();
        tilesets.sort_by_key(|tileset| tileset.first_gid);
        let mut scenery = Scenery {
            tilesets,
            ..Scenery::default()
        };

        for layer in layers.iter().filter(|layer| layer.name != LAYER_COLLISIONS) {
            let mut cells: Vec<Option<PlacedTile>> = Vec::with_capacity(layer.data.len());
            for (index, &gid) in layer.data.iter().enumerate() {
                if gid == 0 {
                    cells.push(None);
                    continue;
                }
                let Some(tileset) = find_tileset(&scenery.tilesets, gid) else {
                    return Err(MapLoadError::MissingTileset {
                        map: map.to_string(),
                        layer: layer.name.clone(),
                        gid,
                    });
                };
                let x = (index % layer.width as usize) as f32;
                let y = (index / layer.width as usize) as f32;
                cells.push(Some(PlacedTile {
                    tileset,
                    local_id: gid - scenery.tilesets[tileset].first_gid,
                    position: Vec2::new(x * tile_size, y * tile_size),
                    sort_y: y * tile_size + tile_size,
                }));
            }

            for object in world_objects.iter().filter(|object| object.layer == layer.name) {
                anchor_world_object(layer, &mut cells, object);
            }

            let target = match DrawPass::for_layer(&layer.name) {
                DrawPass::Ground => &mut scenery.ground,
                DrawPass::Sorted => &mut scenery.sorted,
                DrawPass::Above => &mut scenery.above,
            };
            target.extend(cells.into_iter().flatten());
        }

        Ok(scenery)
    }

    pub fn tilesets(&self) -> &[TilesetData] {
        &self.tilesets
    }

    pub fn tiles(&self, pass: DrawPass) -> &[PlacedTile] {
        match pass {
            DrawPass::Ground => &self.ground,
            DrawPass::Sorted => &self.sorted,
            DrawPass::Above => &self.above,
        }
    }

    /// Local tile id to draw for `tile` after `elapsed_ms` of map time.
    pub fn animated_id(&self, tile: &PlacedTile, elapsed_ms: u64) -> u32 {
        let Some(frames) = self
            .tilesets
            .get(tile.tileset)
            .and_then(|tileset| tileset.animations.get(&tile.local_id))
        else {
            return tile.local_id;
        };
        let total: u64 = frames.iter().map(|frame| u64::from(frame.duration_ms)).sum();
        if total == 0 {
            return frames.first().map_or(tile.local_id, |frame| frame.tile_id);
        }
        let mut remaining = elapsed_ms % total;
        for frame in frames {
            let duration = u64::from(frame.duration_ms);
            if remaining < duration {
                return frame.tile_id;
            }
            remaining -= duration;
        }
        tile.local_id
    }
}

/// Index of the tileset with the greatest `first_gid <= gid`. Expects
/// `tilesets` sorted by `first_gid`.
fn find_tileset(tilesets: &[TilesetData], gid: u32) -> Option<usize> {
    tilesets.iter().rposition(|tileset| tileset.first_gid <= gid)
}

/// Gives every covered tile the anchor tile's sort key so the object y-sorts
/// as one unit. Objects whose anchor cell is empty are ignored.
fn anchor_world_object(
    layer: &TileLayerData,
    cells: &mut [Option<PlacedTile>],
    object: &WorldObjectData,
) {
    let index_of = |x: i32, y: i32| -> Option<usize> {
        if x < 0 || y < 0 || x >= layer.width as i32 || y >= layer.height as i32 {
            return None;
        }
        Some(y as usize * layer.width as usize + x as usize)
    };
    let Some(anchor) = index_of(object.tile_x, object.tile_y)
        .and_then(|index| cells.get(index).copied().flatten())
        .map(|tile| tile.sort_y)
    else {
        return;
    };

    for y in object.tile_y + object.start_y..=object.tile_y + object.end_y {
        for x in object.tile_x + object.start_x..=object.tile_x + object.end_x {
            if let Some(Some(tile)) = index_of(x, y).and_then(|index| cells.get_mut(index)) {
                tile.sort_y = anchor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::content::TileAnimationFrame;

    fn tileset(first_gid: u32) -> TilesetData {
        TilesetData {
            first_gid,
            columns: 4,
            tile_width: 16,
            tile_height: 16,
            animations: BTreeMap::new(),
        }
    }

    fn layer(name: &str, width: u32, data: Vec<u32>) -> TileLayerData {
        TileLayerData {
            name: name.to_string(),
            width,
            height: data.len() as u32 / width,
            data,
        }
    }

    #[test]
    fn layers_split_into_draw_passes() {
        let scenery = Scenery::build(
            "town",
            &[tileset(1)],
            &[
                layer("Ground", 2, vec![1, 2, 3, 4]),
                layer("Drawables", 2, vec![0, 5, 0, 0]),
                layer("AlwaysAbove", 2, vec![0, 0, 6, 0]),
                layer("Collisions", 2, vec![9, 9, 9, 9]),
            ],
            &[],
            32.0,
        )
        .expect("scenery");

        assert_eq!(scenery.tiles(DrawPass::Ground).len(), 4);
        assert_eq!(
            scenery.tiles(DrawPass::Sorted),
            &[PlacedTile {
                tileset: 0,
                local_id: 4,
                position: Vec2::new(32.0, 0.0),
                sort_y: 32.0,
            }]
        );
        assert_eq!(scenery.tiles(DrawPass::Above)[0].position, Vec2::new(0.0, 32.0));
    }

    #[test]
    fn gids_resolve_to_greatest_first_gid() {
        let scenery = Scenery::build(
            "town",
            &[tileset(17), tileset(1)],
            &[layer("Ground", 3, vec![16, 17, 20])],
            &[],
            32.0,
        )
        .expect("scenery");
        let tiles = scenery.tiles(DrawPass::Ground);
        assert_eq!((tiles[0].tileset, tiles[0].local_id), (0, 15));
        assert_eq!((tiles[1].tileset, tiles[1].local_id), (1, 0));
        assert_eq!((tiles[2].tileset, tiles[2].local_id), (1, 3));
    }

    #[test]
    fn gid_without_tileset_is_an_error() {
        let err = Scenery::build("town", &[tileset(10)], &[layer("Ground", 1, vec![3])], &[], 32.0)
            .expect_err("missing tileset");
        assert!(matches!(err, MapLoadError::MissingTileset { gid: 3, .. }));
    }

    #[test]
    fn world_objects_share_the_anchor_sort_key() {
        // A 1x3 tree whose trunk (anchor) sits on row 2.
        let scenery = Scenery::build(
            "town",
            &[tileset(1)],
            &[layer("Drawables", 2, vec![1, 0, 2, 0, 3, 0])],
            &[WorldObjectData {
                tile_x: 0,
                tile_y: 2,
                layer: "Drawables".to_string(),
                start_x: 0,
                start_y: -2,
                end_x: 0,
                end_y: 0,
            }],
            32.0,
        )
        .expect("scenery");
        let keys: Vec<f32> = scenery
            .tiles(DrawPass::Sorted)
            .iter()
            .map(|tile| tile.sort_y)
            .collect();
        assert_eq!(keys, vec![96.0, 96.0, 96.0]);
    }

    #[test]
    fn animations_cycle_by_duration() {
        let mut animated = tileset(1);
        animated.animations.insert(
            0,
            vec![
                TileAnimationFrame {
                    tile_id: 0,
                    duration_ms: 100,
                },
                TileAnimationFrame {
                    tile_id: 1,
                    duration_ms: 50,
                },
            ],
        );
        let scenery = Scenery::build("town", &[animated], &[layer("Ground", 2, vec![1, 2])], &[], 32.0)
            .expect("scenery");
        let tiles = scenery.tiles(DrawPass::Ground);
        assert_eq!(scenery.animated_id(&tiles[0], 0), 0);
        assert_eq!(scenery.animated_id(&tiles[0], 120), 1);
        assert_eq!(scenery.animated_id(&tiles[0], 150), 0);
        assert_eq!(scenery.animated_id(&tiles[1], 120), 1);
    }
}
