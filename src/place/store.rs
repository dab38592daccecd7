//! Lookup of named boundaries

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::place::geometry::Geometry;

/// A single request/response lookup of a place's boundary polygon
///
/// Implementations return geometry in the rasters' native reference system.
pub trait PlaceStore: Send + Sync {
    /// Returns the first boundary whose name matches, if any
    fn find_first(&self, name: &str) -> Result<Option<Geometry>>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

/// A named boundary held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub geometry: Geometry,
}

/// Boundaries loaded from a GeoJSON FeatureCollection
///
/// Matching ignores case. An exact name match wins; otherwise the first
/// feature, in file order, whose name contains the query is returned.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonPlaceStore {
    places: Vec<Place>,
}

impl GeoJsonPlaceStore {
    pub const DEFAULT_NAME_PROPERTY: &'static str = "name";

    /// A store with no boundaries; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_places(places: Vec<Place>) -> Self {
        Self { places }
    }

    /// Loads a FeatureCollection from disk
    pub fn load(path: &Path, name_property: &str) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Store(format!("Failed to read boundaries {}: {}", path.display(), e))
        })?;
        let store = Self::from_geojson(&text, name_property)?;
        info!("Loaded {} boundaries from {}", store.len(), path.display());
        Ok(store)
    }

    /// Parses a FeatureCollection, skipping features without a name or geometry
    pub fn from_geojson(text: &str, name_property: &str) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_str(text)
            .map_err(|e| Error::Store(format!("Invalid boundary GeoJSON: {}", e)))?;

        let mut places = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            let name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(name_property))
                .and_then(|value| value.as_str());
            match (name, feature.geometry) {
                (Some(name), Some(geometry)) => places.push(Place {
                    name: name.to_string(),
                    geometry,
                }),
                _ => debug!("Skipping feature {} without '{}' or geometry", index, name_property),
            }
        }
        Ok(Self { places })
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.places.iter().map(|p| p.name.as_str())
    }
}

impl PlaceStore for GeoJsonPlaceStore {
    fn find_first(&self, name: &str) -> Result<Option<Geometry>> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return Ok(None);
        }

        let exact = self
            .places
            .iter()
            .find(|p| p.name.to_lowercase() == query);
        let found = exact.or_else(|| {
            self.places
                .iter()
                .find(|p| p.name.to_lowercase().contains(&query))
        });
        Ok(found.map(|p| p.geometry.clone()))
    }
}
