use super::dialogue::DialoguePanel;
use super::entity::{Avatar, Player};
use super::geometry::{Rect, Vec2};
use super::map::MapState;
use super::scenery::{DrawPass, PlacedTile, Scenery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Normal,
    Transitioning,
    Dialogue,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteRef {
    Tile { tileset: usize, local_id: u32 },
    Player { frame: u32, row: u32 },
    Npc { name: String, frame: u32, row: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub pass: DrawPass,
    pub sprite: SpriteRef,
    /// Top-left of the tile-sized cell, floored for entities.
    pub position: Vec2,
    pub sort_y: f32,
}

/// Rectangles shown when debug mode is on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugOverlay {
    /// Grid colliders examined by this tick's movement queries.
    pub colliders: Vec<Rect>,
    pub bodies: Vec<Rect>,
    pub interaction_zone: Option<Rect>,
    pub triggers: Vec<Rect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAction {
    pub event: String,
    pub npc: String,
}

/// Read-only snapshot of one tick, everything a renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableFrame {
    pub map: String,
    pub mode: ModeKind,
    pub camera_target: Vec2,
    pub fade_alpha: f32,
    pub draw_list: Vec<DrawItem>,
    pub dialogue: Option<DialoguePanel>,
    pub debug: Option<DebugOverlay>,
    pub skipped_actions: Vec<SkippedAction>,
}

/// Ground tiles, then tiles and entities ordered by sort key, then tiles that
/// always draw on top. Equal keys keep tiles before the player before NPCs.
pub(crate) fn build_draw_list(map: &MapState, player: &Player, elapsed_ms: u64) -> Vec<DrawItem> {
    let scenery = map.scenery();
    let mut items: Vec<DrawItem> = scenery
        .tiles(DrawPass::Ground)
        .iter()
        .map(|tile| tile_item(scenery, tile, DrawPass::Ground, elapsed_ms))
        .collect();

    let mut sorted: Vec<DrawItem> = scenery
        .tiles(DrawPass::Sorted)
        .iter()
        .map(|tile| tile_item(scenery, tile, DrawPass::Sorted, elapsed_ms))
        .collect();
    let (frame, row) = sprite_cell(player.avatar());
    sorted.push(entity_item(SpriteRef::Player { frame, row }, player.avatar()));
    for npc in map.npcs().iter() {
        let (frame, row) = sprite_cell(npc.avatar());
        sorted.push(entity_item(
            SpriteRef::Npc {
                name: npc.name().to_string(),
                frame,
                row,
            },
            npc.avatar(),
        ));
    }
    sorted.sort_by(|a, b| a.sort_y.total_cmp(&b.sort_y));
    items.extend(sorted);

    items.extend(
        scenery
            .tiles(DrawPass::Above)
            .iter()
            .map(|tile| tile_item(scenery, tile, DrawPass::Above, elapsed_ms)),
    );
    items
}

fn tile_item(scenery: &Scenery, tile: &PlacedTile, pass: DrawPass, elapsed_ms: u64) -> DrawItem {
    DrawItem {
        pass,
        sprite: SpriteRef::Tile {
            tileset: tile.tileset,
            local_id: scenery.animated_id(tile, elapsed_ms),
        },
        position: tile.position,
        sort_y: tile.sort_y,
    }
}

fn sprite_cell(avatar: &Avatar) -> (u32, u32) {
    (avatar.animation().frame(), avatar.facing().sprite_row())
}

fn entity_item(sprite: SpriteRef, avatar: &Avatar) -> DrawItem {
    DrawItem {
        pass: DrawPass::Sorted,
        sprite,
        position: avatar.position().floor(),
        sort_y: avatar.body().bottom(),
    }
}
