//! Named administrative boundaries

pub mod geometry;
pub mod resolver;
pub mod store;

pub use geometry::{Bounds, Geometry, Position};
pub use resolver::PlaceResolver;
pub use store::{GeoJsonPlaceStore, Place, PlaceStore};
