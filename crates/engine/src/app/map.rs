use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::content::{ActionDef, ContentError, EventDef, MapData, SpawnOwner};

use super::collision::{CollisionGrid, CollisionGridError};
use super::config::SimulationConfig;
use super::dialogue::{Dialogue, DialogueLine};
use super::entity::{Npc, NpcRoster};
use super::geometry::{Direction, Vec2};
use super::scenery::Scenery;
use super::triggers::{DialogueTrigger, EventTrigger, InteractionIndex, TransitionTrigger};

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("map '{map}' has an invalid collision grid: {source}")]
    Grid {
        map: String,
        #[source]
        source: CollisionGridError,
    },
    #[error("map '{map}' has no tile layers")]
    NoTileLayers { map: String },
    #[error("tile layer '{layer}' of map '{map}' has {actual} cells, expected {expected}")]
    LayerShape {
        map: String,
        layer: String,
        expected: usize,
        actual: usize,
    },
    #[error(
        "collision grid of map '{map}' is {actual_width}x{actual_height}, \
expected {expected_width}x{expected_height}"
    )]
    CollisionShape {
        map: String,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("map '{map}' has no player spawn point named '{spawn}'")]
    MissingPlayerSpawn { map: String, spawn: String },
    #[error("map '{map}' defines NPC '{npc}' more than once")]
    DuplicateNpc { map: String, npc: String },
    #[error("map '{map}' defines dialogue '{dialogue}' more than once")]
    DuplicateDialogue { map: String, dialogue: String },
    #[error("map '{map}' defines event '{event}' more than once")]
    DuplicateEvent { map: String, event: String },
    #[error("dialogue '{dialogue}' of map '{map}' has no lines")]
    EmptyDialogue { map: String, dialogue: String },
    #[error("{owner} in map '{map}' references unknown dialogue '{dialogue}'")]
    UnknownDialogue {
        map: String,
        owner: String,
        dialogue: String,
    },
    #[error("event '{event}' in map '{map}' references unknown NPC '{npc}'")]
    UnknownNpc {
        map: String,
        event: String,
        npc: String,
    },
    #[error("event point in map '{map}' references unknown event '{event}'")]
    UnknownEvent { map: String, event: String },
    #[error("tile {gid} in layer '{layer}' of map '{map}' has no tileset")]
    MissingTileset { map: String, layer: String, gid: u32 },
}

#[derive(Debug, Clone)]
pub struct MapEvent {
    pub def: Arc<EventDef>,
    /// Set once the event completes; cleared only by reloading the map.
    pub triggered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSpawn {
    pub position: Vec2,
    pub facing: Option<Direction>,
}

/// Everything owned by one loaded map. Rebuilt from scratch on every load.
#[derive(Debug, Clone)]
pub struct MapState {
    name: String,
    generation: u64,
    grid: CollisionGrid,
    npcs: NpcRoster,
    dialogues: HashMap<String, Arc<Dialogue>>,
    events: Vec<MapEvent>,
    triggers: InteractionIndex,
    scenery: Scenery,
    player_spawn: PlayerSpawn,
}

impl MapState {
    /// Validates `data` and builds the runtime map, placing the player at the
    /// spawn point named `spawn`.
    pub fn build(
        data: &MapData,
        spawn: &str,
        generation: u64,
        config: &SimulationConfig,
    ) -> Result<Self, MapLoadError> {
        let map = data.name.as_str();
        let (width, height) = validate_layers(data)?;
        if data.collision.width != width || data.collision.height != height {
            return Err(MapLoadError::CollisionShape {
                map: map.to_string(),
                expected_width: width,
                expected_height: height,
                actual_width: data.collision.width,
                actual_height: data.collision.height,
            });
        }
        let grid = CollisionGrid::new(width, height, config.tile_size, data.collision.codes.clone())
            .map_err(|source| MapLoadError::Grid {
                map: map.to_string(),
                source,
            })?;

        let dialogues = build_dialogues(data)?;
        let lookup_dialogue = |owner: String, name: &str| {
            dialogues
                .get(name)
                .cloned()
                .ok_or_else(|| MapLoadError::UnknownDialogue {
                    map: map.to_string(),
                    owner,
                    dialogue: name.to_string(),
                })
        };

        let player_spawn = data
            .spawn_points
            .iter()
            .find(|point| point.owner == SpawnOwner::Player && point.name == spawn)
            .map(|point| PlayerSpawn {
                position: point.position,
                facing: point.facing,
            })
            .ok_or_else(|| MapLoadError::MissingPlayerSpawn {
                map: map.to_string(),
                spawn: spawn.to_string(),
            })?;

        let mut npcs: Vec<Npc> = Vec::new();
        for point in data
            .spawn_points
            .iter()
            .filter(|point| point.owner == SpawnOwner::Npc)
        {
            if npcs.iter().any(|npc| npc.name() == point.name) {
                return Err(MapLoadError::DuplicateNpc {
                    map: map.to_string(),
                    npc: point.name.clone(),
                });
            }
            let dialogue = point
                .dialogue
                .as_deref()
                .map(|name| lookup_dialogue(format!("NPC '{}'", point.name), name))
                .transpose()?;
            npcs.push(Npc::new(
                point.name.clone(),
                point.position,
                point.facing.unwrap_or(Direction::Down),
                config.npc_speed,
                dialogue,
            ));
        }

        let mut events: Vec<MapEvent> = Vec::new();
        for def in &data.events {
            if events.iter().any(|event| event.def.name == def.name) {
                return Err(MapLoadError::DuplicateEvent {
                    map: map.to_string(),
                    event: def.name.clone(),
                });
            }
            validate_event(map, def, &npcs, &dialogues)?;
            events.push(MapEvent {
                def: Arc::new(def.clone()),
                triggered: false,
            });
        }

        let mut dialogue_triggers = Vec::with_capacity(data.dialogue_points.len());
        for point in &data.dialogue_points {
            dialogue_triggers.push(DialogueTrigger {
                area: point.area,
                dialogue: lookup_dialogue("dialogue point".to_string(), &point.dialogue)?,
            });
        }

        let mut event_triggers = Vec::with_capacity(data.event_points.len());
        for point in &data.event_points {
            let event_index = events
                .iter()
                .position(|event| event.def.name == point.event)
                .ok_or_else(|| MapLoadError::UnknownEvent {
                    map: map.to_string(),
                    event: point.event.clone(),
                })?;
            event_triggers.push(EventTrigger {
                area: point.area,
                event_index,
            });
        }

        let transition_triggers = data
            .transitions
            .iter()
            .map(|transition| TransitionTrigger {
                area: transition.area,
                map: transition.map.clone(),
                spawn: transition.spawn.clone(),
            })
            .collect();

        let scenery = Scenery::build(
            map,
            &data.tilesets,
            &data.tile_layers,
            &data.world_objects,
            config.tile_size,
        )?;

        Ok(Self {
            name: data.name.clone(),
            generation,
            grid,
            npcs: NpcRoster::new(generation, npcs),
            dialogues,
            events,
            triggers: InteractionIndex::new(transition_triggers, dialogue_triggers, event_triggers),
            scenery,
            player_spawn,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn grid(&self) -> &CollisionGrid {
        &self.grid
    }

    pub fn npcs(&self) -> &NpcRoster {
        &self.npcs
    }

    pub fn npcs_mut(&mut self) -> &mut NpcRoster {
        &mut self.npcs
    }

    pub fn dialogue(&self, name: &str) -> Option<&Arc<Dialogue>> {
        self.dialogues.get(name)
    }

    pub fn events(&self) -> &[MapEvent] {
        &self.events
    }

    pub fn event(&self, index: usize) -> Option<&MapEvent> {
        self.events.get(index)
    }

    pub fn is_event_triggered(&self, index: usize) -> bool {
        self.events.get(index).is_some_and(|event| event.triggered)
    }

    pub fn mark_event_triggered(&mut self, index: usize) {
        if let Some(event) = self.events.get_mut(index) {
            event.triggered = true;
        }
    }

    pub fn triggers(&self) -> &InteractionIndex {
        &self.triggers
    }

    pub fn scenery(&self) -> &Scenery {
        &self.scenery
    }

    pub fn player_spawn(&self) -> PlayerSpawn {
        self.player_spawn
    }
}

/// Checks every tile layer's cell count and returns the first layer's size.
fn validate_layers(data: &MapData) -> Result<(u32, u32), MapLoadError> {
    for layer in &data.tile_layers {
        let expected = layer.width as usize * layer.height as usize;
        if layer.data.len() != expected {
            return Err(MapLoadError::LayerShape {
                map: data.name.clone(),
                layer: layer.name.clone(),
                expected,
                actual: layer.data.len(),
            });
        }
    }
    data.tile_layers
        .first()
        .map(|layer| (layer.width, layer.height))
        .ok_or_else(|| MapLoadError::NoTileLayers {
            map: data.name.clone(),
        })
}

fn build_dialogues(data: &MapData) -> Result<HashMap<String, Arc<Dialogue>>, MapLoadError> {
    let mut dialogues = HashMap::with_capacity(data.dialogues.len());
    for def in &data.dialogues {
        if def.sentences.is_empty() {
            return Err(MapLoadError::EmptyDialogue {
                map: data.name.clone(),
                dialogue: def.name.clone(),
            });
        }
        let dialogue = Dialogue {
            name: def.name.clone(),
            lines: def
                .sentences
                .iter()
                .map(|sentence| DialogueLine {
                    speaker: sentence.speaker.clone(),
                    text: sentence.msg.clone(),
                })
                .collect(),
        };
        if dialogues
            .insert(def.name.clone(), Arc::new(dialogue))
            .is_some()
        {
            return Err(MapLoadError::DuplicateDialogue {
                map: data.name.clone(),
                dialogue: def.name.clone(),
            });
        }
    }
    Ok(dialogues)
}

fn validate_event(
    map: &str,
    def: &EventDef,
    npcs: &[Npc],
    dialogues: &HashMap<String, Arc<Dialogue>>,
) -> Result<(), MapLoadError> {
    let mut result = Ok(());
    for action in &def.actions {
        action.visit(&mut |action| {
            if result.is_err() {
                return;
            }
            match action {
                ActionDef::MoveNpc { npc, .. }
                    if !npcs.iter().any(|known| known.name() == npc.as_str()) =>
                {
                    result = Err(MapLoadError::UnknownNpc {
                        map: map.to_string(),
                        event: def.name.clone(),
                        npc: npc.clone(),
                    });
                }
                ActionDef::Dialogue { dialogue } if !dialogues.contains_key(dialogue) => {
                    result = Err(MapLoadError::UnknownDialogue {
                        map: map.to_string(),
                        owner: format!("event '{}'", def.name),
                        dialogue: dialogue.clone(),
                    });
                }
                _ => {}
            }
        });
    }
    result
}


#[cfg(test)]
mod tests {
    use super::test_maps::*;
    use super::*;
    use crate::app::geometry::Rect;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    fn town() -> MapData {
        let mut data = open_map("town", 6, 5);
        data.spawn_points = vec![
            player_spawn("gate", 32.0, 32.0),
            npc_spawn("ada", 96.0, 64.0, Some("greeting")),
            npc_spawn("bo", 128.0, 64.0, None),
        ];
        data.dialogues = vec![dialogue("greeting", &[("Ada", "Hello")])];
        data.events = vec![EventDef {
            name: "intro".to_string(),
            actions: vec![ActionDef::Group {
                actions: vec![ActionDef::MoveNpc {
                    npc: "bo".to_string(),
                    tiles: 1,
                    direction: Direction::Up,
                    follow: false,
                }],
            }],
        }];
        data.event_points = vec![event_point(Rect::new(0.0, 0.0, 32.0, 32.0), "intro")];
        data
    }

    #[test]
    fn builds_roster_triggers_and_shared_dialogues() {
        let state = MapState::build(&town(), "gate", 4, &config()).expect("map");
        assert_eq!(state.generation(), 4);
        assert_eq!(state.grid().width(), 6);
        assert_eq!(state.player_spawn().position, Vec2::new(32.0, 32.0));
        assert_eq!(state.npcs().len(), 2);

        let ada = state
            .npcs()
            .get(state.npcs().resolve("ada").expect("ada"))
            .expect("npc");
        assert_eq!(ada.avatar().facing(), Direction::Left);
        let shared = state.dialogue("greeting").expect("dialogue");
        assert!(Arc::ptr_eq(ada.dialogue().expect("npc dialogue"), shared));
        assert_eq!(state.triggers().events()[0].event_index, 0);
        assert!(!state.is_event_triggered(0));
    }

    #[test]
    fn missing_player_spawn_is_reported() {
        let err = MapState::build(&town(), "cellar", 1, &config()).expect_err("missing spawn");
        assert!(matches!(
            err,
            MapLoadError::MissingPlayerSpawn { ref spawn, .. } if spawn == "cellar"
        ));
    }

    #[test]
    fn dangling_names_are_rejected() {
        let mut data = town();
        data.spawn_points.push(npc_spawn("cy", 0.0, 0.0, Some("farewell")));
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::UnknownDialogue { .. })
        ));

        let mut data = town();
        data.events[0].actions.push(ActionDef::MoveNpc {
            npc: "ghost".to_string(),
            tiles: 1,
            direction: Direction::Down,
            follow: false,
        });
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::UnknownNpc { ref npc, .. }) if npc == "ghost"
        ));

        let mut data = town();
        data.event_points.push(event_point(Rect::new(0.0, 0.0, 1.0, 1.0), "outro"));
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn duplicate_npcs_and_empty_dialogues_are_rejected() {
        let mut data = town();
        data.spawn_points.push(npc_spawn("ada", 0.0, 0.0, None));
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::DuplicateNpc { .. })
        ));

        let mut data = town();
        data.dialogues.push(dialogue("silence", &[]));
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::EmptyDialogue { .. })
        ));
    }

    #[test]
    fn grid_must_match_the_first_tile_layer() {
        let mut data = town();
        data.collision.width = 5;
        data.collision.codes.truncate(25);
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::CollisionShape { .. })
        ));

        let mut data = town();
        data.collision.codes[3] = 200;
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::Grid { .. })
        ));

        let mut data = town();
        data.tile_layers.clear();
        assert!(matches!(
            MapState::build(&data, "gate", 1, &config()),
            Err(MapLoadError::NoTileLayers { .. })
        ));
    }
}
