//! Place name to boundary geometry

use std::sync::Arc;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::place::geometry::Geometry;
use crate::place::store::PlaceStore;
use crate::projection::Transformer;

/// Resolves place names through a [`PlaceStore`]
///
/// Resolution only produces geometry for display; it never starts an extraction.
#[derive(Clone)]
pub struct PlaceResolver {
    store: Arc<dyn PlaceStore>,
    transformer: Transformer,
}

impl PlaceResolver {
    pub fn new(store: Arc<dyn PlaceStore>, transformer: Transformer) -> Self {
        Self { store, transformer }
    }

    /// Boundary in the native reference system, as stored
    pub fn resolve(&self, name: &str) -> Result<Geometry> {
        info!("Requesting polygon for: {}", name);
        match self.store.find_first(name)? {
            Some(geometry) => {
                debug!("Found {} for '{}'", geometry.type_name(), name);
                Ok(geometry)
            }
            None => Err(Error::PlaceNotFound(name.to_string())),
        }
    }

    /// Boundary converted to the display reference system for the map
    pub fn resolve_for_display(&self, name: &str) -> Result<Geometry> {
        let native = self.resolve(name)?;
        self.transformer.geometry_to_display(&native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::store::{GeoJsonPlaceStore, Place};
    use crate::projection::Coordinate;

    struct FailingStore;

    impl PlaceStore for FailingStore {
        fn find_first(&self, _name: &str) -> Result<Option<Geometry>> {
            Err(Error::Store("connection refused".to_string()))
        }
    }

    fn resolver() -> PlaceResolver {
        let transformer = Transformer::rd_new().unwrap();
        let display = Geometry::rectangle(
            Coordinate::from_lonlat(5.0, 52.0),
            Coordinate::from_lonlat(5.1, 52.1),
        );
        let store = GeoJsonPlaceStore::from_places(vec![Place {
            name: "Zeist".to_string(),
            geometry: transformer.geometry_to_native(&display).unwrap(),
        }]);
        PlaceResolver::new(Arc::new(store), transformer)
    }

    #[test]
    fn test_resolve_native_and_display() {
        let resolver = resolver();
        let native = resolver.resolve("zeist").unwrap();
        assert!(native.bounds().unwrap().min.x > 100_000.0);

        let display = resolver.resolve_for_display("Zeist").unwrap();
        let bounds = display.bounds().unwrap();
        assert!((bounds.min.x - 5.0).abs() < 1e-9);
        assert!((bounds.max.y - 52.1).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_place() {
        let err = resolver().resolve("Atlantis").unwrap_err();
        assert!(matches!(err, Error::PlaceNotFound(ref n) if n == "Atlantis"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_store_failure_propagates() {
        let resolver = PlaceResolver::new(Arc::new(FailingStore), Transformer::rd_new().unwrap());
        assert!(matches!(resolver.resolve("Zeist"), Err(Error::Store(_))));
    }
}
