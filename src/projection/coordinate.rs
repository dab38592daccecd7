use serde::{Deserialize, Serialize};

/// Represents a coordinate in any coordinate reference system
///
/// In the display system `x` is longitude and `y` latitude, in degrees.
/// In the native system both are metres (easting, northing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    /// Creates a new 2D coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a coordinate from longitude/latitude in degrees
    pub fn from_lonlat(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat)
    }

    /// Longitude in degrees (display system)
    pub fn lon(&self) -> f64 {
        self.x
    }

    /// Latitude in degrees (display system)
    pub fn lat(&self) -> f64 {
        self.y
    }

    /// Returns true for finite longitude/latitude within ±180/±90
    pub fn is_valid_lonlat(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (-180.0..=180.0).contains(&self.x)
            && (-90.0..=90.0).contains(&self.y)
    }

    /// Creates a display coordinate, rejecting anything outside ±180/±90
    pub fn checked_lonlat(lon: f64, lat: f64) -> Option<Self> {
        let coord = Self::from_lonlat(lon, lat);
        coord.is_valid_lonlat().then_some(coord)
    }

    /// Converts to a GeoJSON position
    pub fn to_position(self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lonlat_ranges() {
        assert!(Coordinate::from_lonlat(180.0, -90.0).is_valid_lonlat());
        assert!(!Coordinate::from_lonlat(180.1, 0.0).is_valid_lonlat());
        assert!(!Coordinate::from_lonlat(0.0, f64::NAN).is_valid_lonlat());
        assert!(Coordinate::checked_lonlat(5.0, 91.0).is_none());
        assert_eq!(Coordinate::checked_lonlat(5.0, 52.0).map(|c| c.lat()), Some(52.0));
    }
}
