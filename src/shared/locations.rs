//! Named campus locations and their map coordinates

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use utoipa::ToSchema;

use crate::shared::constants::{DEFAULT_COORDINATE, OTHER_LOCATION, OTHER_LOCATION_PREFIX};

/// A `[lat, lon]` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    fn from_pair(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[0],
            lon: pair[1],
        }
    }

    /// Bit-exact key, so equal coordinates group together
    pub fn key(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }
}

/// Location table loaded from the locations JSON file
#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    locations: HashMap<String, Coordinate>,
}

impl LocationCatalog {
    /// Parse `{"name": [lat, lon], ...}`; keys starting with `_` are comments.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;

        let mut locations = HashMap::new();
        for (name, value) in raw {
            if name.starts_with('_') {
                continue;
            }
            let pair: [f64; 2] = serde_json::from_value(value)?;
            locations.insert(name, Coordinate::from_pair(pair));
        }

        Ok(Self { locations })
    }

    /// Load the catalog from disk. A missing or invalid file yields an empty catalog.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| Self::from_json(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(catalog) => {
                tracing::info!(
                    "Loaded {} locations from {}",
                    catalog.len(),
                    path.display()
                );
                catalog
            }
            Err(e) => {
                tracing::error!("Failed to load locations from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Whether `name` is a selectable location (a catalog entry or the other-location marker)
    pub fn is_selectable(&self, name: &str) -> bool {
        name == OTHER_LOCATION || self.locations.contains_key(name)
    }

    /// Location names in alphabetical order, for form options
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.locations.keys().cloned().collect();
        if !names.iter().any(|n| n == OTHER_LOCATION) {
            names.push(OTHER_LOCATION.to_string());
        }
        names.sort();
        names
    }

    /// Coordinate of the other-location marker, used for anything unresolvable
    pub fn default_coordinate(&self) -> Coordinate {
        self.locations
            .get(OTHER_LOCATION)
            .copied()
            .unwrap_or_else(|| Coordinate::from_pair(DEFAULT_COORDINATE))
    }

    /// Resolve a stored `local` value to a map coordinate
    pub fn resolve(&self, local: &str) -> Coordinate {
        if local.starts_with(OTHER_LOCATION_PREFIX) {
            return self.default_coordinate();
        }
        self.locations
            .get(local)
            .copied()
            .unwrap_or_else(|| self.default_coordinate())
    }
}

/// Group items by the coordinate of their location, keeping first-seen order
/// of coordinates and the original order of items within a group.
pub fn group_by_coordinate<T, F>(
    catalog: &LocationCatalog,
    items: Vec<T>,
    local_of: F,
) -> Vec<(Coordinate, Vec<T>)>
where
    F: Fn(&T) -> &str,
{
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    let mut groups: Vec<(Coordinate, Vec<T>)> = Vec::new();

    for item in items {
        let coordinate = catalog.resolve(local_of(&item));
        match index.get(&coordinate.key()) {
            Some(&position) => groups[position].1.push(item),
            None => {
                index.insert(coordinate.key(), groups.len());
                groups.push((coordinate, vec![item]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "_comentario": "coordenadas aproximadas",
        "Bloco C-56": [-23.4050, -51.9380],
        "Biblioteca Central": [-23.4058, -51.9389],
        "Outro Local / Não Listado": [-23.4065, -51.9395]
    }"#;

    #[test]
    fn test_comment_keys_are_ignored() {
        let catalog = LocationCatalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_selectable("_comentario"));
        assert!(catalog.is_selectable("Bloco C-56"));
    }

    #[test]
    fn test_other_prefix_and_unknown_use_default() {
        let catalog = LocationCatalog::from_json(SAMPLE).unwrap();
        let default = catalog.default_coordinate();

        assert_eq!(catalog.resolve("Outro: Biblioteca Central"), default);
        assert_eq!(catalog.resolve("Lugar inexistente"), default);
        assert_eq!(
            catalog.resolve("Biblioteca Central"),
            Coordinate {
                lat: -23.4058,
                lon: -51.9389
            }
        );
    }

    #[test]
    fn test_empty_catalog_falls_back_to_constant() {
        let catalog = LocationCatalog::default();
        assert_eq!(
            catalog.default_coordinate(),
            Coordinate::from_pair(DEFAULT_COORDINATE)
        );
        assert!(catalog.is_selectable(OTHER_LOCATION));
        assert_eq!(catalog.sorted_names(), vec![OTHER_LOCATION.to_string()]);
    }

    #[test]
    fn test_missing_file_yields_empty_catalog() {
        let catalog = LocationCatalog::load("/definitely/not/here.json");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let catalog = LocationCatalog::from_json(SAMPLE).unwrap();
        let items = vec![
            ("a", "Bloco C-56"),
            ("b", "Outro: Cantina"),
            ("c", "Bloco C-56"),
            ("d", "Outro Local / Não Listado"),
        ];

        let groups = group_by_coordinate(&catalog, items, |item| item.1);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.lat, -23.4050);
        let first: Vec<&str> = groups[0].1.iter().map(|i| i.0).collect();
        let second: Vec<&str> = groups[1].1.iter().map(|i| i.0).collect();
        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(second, vec!["b", "d"]);
    }
}
