//! Coordinate transforms between the map's display system and the rasters' native system

pub mod coordinate;
pub mod transformer;

pub use coordinate::Coordinate;
pub use transformer::{Transformer, DISPLAY_CRS, RD_NEW};
