use std::collections::HashMap;

use super::types::{ContentError, MapData};

/// Source of map data. The simulation asks for maps by name on startup and on
/// every transition.
pub trait MapDataProvider {
    fn load_map(&self, name: &str) -> Result<MapData, ContentError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMapProvider {
    maps: HashMap<String, MapData>,
}

impl InMemoryMapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_map(mut self, map: MapData) -> Self {
        self.insert(map);
        self
    }

    pub fn insert(&mut self, map: MapData) {
        self.maps.insert(map.name.clone(), map);
    }
}

impl MapDataProvider for InMemoryMapProvider {
    fn load_map(&self, name: &str) -> Result<MapData, ContentError> {
        self.maps
            .get(name)
            .cloned()
            .ok_or_else(|| ContentError::MapNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_maps_are_not_found() {
        let provider = InMemoryMapProvider::new().with_map(MapData {
            name: "town".to_string(),
            ..MapData::default()
        });
        assert_eq!(provider.load_map("town").expect("town").name, "town");
        assert!(matches!(
            provider.load_map("cave"),
            Err(ContentError::MapNotFound { name }) if name == "cave"
        ));
    }
}
