use std::fmt;
use std::sync::{Arc, Mutex};

use proj::Proj;

use crate::error::{Error, Result};
use crate::place::Geometry;
use crate::projection::coordinate::Coordinate;

/// Geographic longitude/latitude used by the map
pub const DISPLAY_CRS: &str = "EPSG:4326";

/// Amersfoort / RD New as the front-end defines it, without a datum shift
pub const RD_NEW: &str = "+proj=sterea +lat_0=52.15616055555555 +lon_0=5.38763888888889 \
+k=0.9999079 +x_0=155000 +y_0=463000 +ellps=bessel +units=m +no_defs";

/// Largest distance from the false origin, in metres, accepted from a forward
/// transform. Beyond it the point lies within about a degree of the antipode.
const MAX_NATIVE_RADIUS: f64 = 1e9;

/// Degrees a forward then inverse transform may drift before the point is
/// treated as outside the projection's one-to-one domain
const ROUND_TRIP_TOLERANCE: f64 = 1e-7;

/// Transforms coordinates between the map's display system and the rasters' native system
///
/// The display system is geographic longitude/latitude in degrees. The native
/// system is the projected system the source rasters are stored in.
#[derive(Clone)]
pub struct Transformer {
    forward: Arc<Mutex<Proj>>,
    inverse: Arc<Mutex<Proj>>,
    native: String,
}

fn create(from: &str, to: &str) -> Result<Proj> {
    Proj::new_known_crs(from, to, None)
        .map_err(|e| Error::Projection(format!("Failed to create projection: {}", e)))
}

/// PROJ strings need `+type=crs` to be accepted as a CRS, EPSG codes do not
fn as_crs(definition: &str) -> String {
    if definition.trim_start().starts_with('+') && !definition.contains("+type=crs") {
        format!("{} +type=crs", definition)
    } else {
        definition.to_string()
    }
}

fn convert(proj: &Mutex<Proj>, coord: Coordinate) -> Result<Coordinate> {
    let proj = proj
        .lock()
        .map_err(|_| Error::Projection("Projection lock poisoned".to_string()))?;
    let (x, y) = proj
        .convert((coord.x, coord.y))
        .map_err(|e| Error::Projection(format!("Transformation failed: {}", e)))?;
    Ok(Coordinate::new(x, y))
}

impl Transformer {
    /// Creates a transformer between two systems
    ///
    /// Both definitions may be `EPSG:xxxx` codes or PROJ strings.
    pub fn new(display: &str, native: &str) -> Result<Self> {
        let (display_crs, native_crs) = (as_crs(display), as_crs(native));
        let forward = create(&display_crs, &native_crs)?;
        let inverse = create(&native_crs, &display_crs)?;

        Ok(Self {
            forward: Arc::new(Mutex::new(forward)),
            inverse: Arc::new(Mutex::new(inverse)),
            native: native.to_string(),
        })
    }

    /// Creates the display <-> Amersfoort / RD New transformer
    pub fn rd_new() -> Result<Self> {
        Self::new(DISPLAY_CRS, RD_NEW)
    }

    /// Transforms a display coordinate (lon, lat) into the native system
    ///
    /// Points the projection cannot represent one-to-one are rejected: the
    /// neighbourhood of the origin's antipode and the thin longitude band
    /// that folds over the opposite meridian.
    pub fn to_native(&self, coord: Coordinate) -> Result<Coordinate> {
        if !coord.is_valid_lonlat() {
            return Err(Error::Projection(format!(
                "({}, {}) is not a valid longitude/latitude",
                coord.x, coord.y
            )));
        }

        let native = convert(&self.forward, coord)?;
        let finite = native.x.is_finite() && native.y.is_finite();
        if !finite || native.x.hypot(native.y) > MAX_NATIVE_RADIUS {
            return Err(Error::Projection(format!(
                "({}, {}) is too close to the antipode of the projection origin",
                coord.x, coord.y
            )));
        }

        let back = convert(&self.inverse, native)?;
        let drift = (back.x - coord.x).abs().max((back.y - coord.y).abs());
        if drift > ROUND_TRIP_TOLERANCE {
            return Err(Error::Projection(format!(
                "({}, {}) lies outside the projection's domain",
                coord.x, coord.y
            )));
        }
        Ok(native)
    }

    /// Transforms a native coordinate back into the display system
    pub fn to_display(&self, coord: Coordinate) -> Result<Coordinate> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(Error::Projection(format!(
                "({}, {}) is not a finite projected coordinate",
                coord.x, coord.y
            )));
        }

        let display = convert(&self.inverse, coord)?;
        if !display.is_valid_lonlat() {
            return Err(Error::Projection(format!(
                "({}, {}) has no longitude/latitude",
                coord.x, coord.y
            )));
        }
        Ok(display)
    }

    /// Transforms multiple display coordinates in bulk
    pub fn to_native_many(&self, coords: &[Coordinate]) -> Result<Vec<Coordinate>> {
        coords.iter().map(|&coord| self.to_native(coord)).collect()
    }

    /// Transforms multiple native coordinates in bulk
    pub fn to_display_many(&self, coords: &[Coordinate]) -> Result<Vec<Coordinate>> {
        coords.iter().map(|&coord| self.to_display(coord)).collect()
    }

    /// Transforms every position of a display geometry into the native system
    pub fn geometry_to_native(&self, geometry: &Geometry) -> Result<Geometry> {
        geometry.try_map(|coord| self.to_native(coord))
    }

    /// Transforms every position of a native geometry into the display system
    pub fn geometry_to_display(&self, geometry: &Geometry) -> Result<Geometry> {
        geometry.try_map(|coord| self.to_display(coord))
    }

    /// Definition of the native system
    pub fn native_definition(&self) -> &str {
        &self.native
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("native", &self.native)
            .finish()
    }
}
