//! Validation of raw extraction input into a well-formed request

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::projection::{Coordinate, Transformer};

/// Elevation product served by the extraction endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Product {
    /// Digital terrain model (bare earth)
    #[serde(rename = "DTM")]
    Dtm,
    /// Digital surface model (including buildings and vegetation)
    #[serde(rename = "DSM")]
    Dsm,
}

impl Product {
    pub const ALL: [Product; 2] = [Product::Dtm, Product::Dsm];

    /// Returns the selector string used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Dtm => "DTM",
            Product::Dsm => "DSM",
        }
    }
}

impl FromStr for Product {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidProduct(s.to_string()))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output resolution selector, ordered from finest to coarsest
///
/// The value is handed to the clipping tool as the target ground-sample-distance
/// in native units. Requests finer than the source raster are not rejected:
/// the tool resamples (upsamples) to the requested pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    HalfMetre,
    OneMetre,
    TwoMetres,
    FourMetres,
    EightMetres,
    SixteenMetres,
    ThirtyTwoMetres,
}

impl Resolution {
    pub const ALL: [Resolution; 7] = [
        Resolution::HalfMetre,
        Resolution::OneMetre,
        Resolution::TwoMetres,
        Resolution::FourMetres,
        Resolution::EightMetres,
        Resolution::SixteenMetres,
        Resolution::ThirtyTwoMetres,
    ];

    /// Returns the selector label used on the wire, e.g. `"2.0 m"`
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::HalfMetre => "0.5 m",
            Resolution::OneMetre => "1.0 m",
            Resolution::TwoMetres => "2.0 m",
            Resolution::FourMetres => "4.0 m",
            Resolution::EightMetres => "8.0 m",
            Resolution::SixteenMetres => "16.0 m",
            Resolution::ThirtyTwoMetres => "32.0 m",
        }
    }

    /// Ground-sample-distance in metres
    pub fn ground_sample_distance(&self) -> f64 {
        match self {
            Resolution::HalfMetre => 0.5,
            Resolution::OneMetre => 1.0,
            Resolution::TwoMetres => 2.0,
            Resolution::FourMetres => 4.0,
            Resolution::EightMetres => 8.0,
            Resolution::SixteenMetres => 16.0,
            Resolution::ThirtyTwoMetres => 32.0,
        }
    }
}

impl FromStr for Resolution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| ValidationError::InvalidResolution(s.to_string()))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A coordinate field as submitted: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(serde_json::Number),
    Text(String),
}

impl CoordinateValue {
    /// Parses the value as a finite float
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            CoordinateValue::Number(n) => n.as_f64()?,
            CoordinateValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for CoordinateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateValue::Number(n) => write!(f, "{}", n),
            CoordinateValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl From<&str> for CoordinateValue {
    fn from(s: &str) -> Self {
        CoordinateValue::Text(s.to_string())
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(CoordinateValue::Number)
            .unwrap_or_else(|| CoordinateValue::Text(value.to_string()))
    }
}

/// Extraction input exactly as the client sent it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExtractionRequest {
    #[serde(default)]
    pub x1: Option<CoordinateValue>,
    #[serde(default)]
    pub y1: Option<CoordinateValue>,
    #[serde(default)]
    pub x2: Option<CoordinateValue>,
    #[serde(default)]
    pub y2: Option<CoordinateValue>,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub resolution: String,
}

impl RawExtractionRequest {
    /// Convenience constructor from two display corners given as text
    pub fn from_text(
        corner1: (&str, &str),
        corner2: (&str, &str),
        product: &str,
        resolution: &str,
    ) -> Self {
        Self {
            x1: Some(corner1.0.into()),
            y1: Some(corner1.1.into()),
            x2: Some(corner2.0.into()),
            y2: Some(corner2.1.into()),
            product: product.to_string(),
            resolution: resolution.to_string(),
        }
    }
}

/// Axis-aligned bounds in the native reference system, min strictly below max
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NativeBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl NativeBounds {
    /// Normalises two opposite corners, whatever their order
    pub fn from_corners(a: Coordinate, b: Coordinate) -> Option<Self> {
        let bounds = Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        };
        (bounds.min_x < bounds.max_x && bounds.min_y < bounds.max_y).then_some(bounds)
    }

    /// Upper-left x, upper-left y, lower-right x, lower-right y
    pub fn projwin(&self) -> [f64; 4] {
        [self.min_x, self.max_y, self.max_x, self.min_y]
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A validated, transformed extraction request
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub product: Product,
    pub resolution: Resolution,
    pub bounds: NativeBounds,
    /// Corner values as the caller wrote them: x1, y1, x2, y2
    pub corner_labels: [String; 4],
}

fn parse_field(name: &str, value: &Option<CoordinateValue>) -> Result<f64, ValidationError> {
    match value {
        None => Err(ValidationError::InvalidCoordinates(format!("{} is missing", name))),
        Some(v) => v.parse().ok_or_else(|| {
            ValidationError::InvalidCoordinates(format!("{} is not a number: '{}'", name, v))
        }),
    }
}

fn display_corner(index: usize, lon: f64, lat: f64) -> Result<Coordinate, ValidationError> {
    Coordinate::checked_lonlat(lon, lat).ok_or_else(|| {
        ValidationError::InvalidCoordinates(format!(
            "corner {} ({}, {}) is outside longitude ±180 / latitude ±90",
            index, lon, lat
        ))
    })
}

impl ExtractionRequest {
    /// Validates raw input and transforms it into the native reference system
    ///
    /// Checks run in a fixed order: coordinates, degenerate box, product,
    /// resolution. No I/O happens here.
    pub fn build(
        raw: &RawExtractionRequest,
        transformer: &Transformer,
    ) -> Result<Self, ValidationError> {
        let x1 = parse_field("x1", &raw.x1)?;
        let y1 = parse_field("y1", &raw.y1)?;
        let x2 = parse_field("x2", &raw.x2)?;
        let y2 = parse_field("y2", &raw.y2)?;
        let corner1 = display_corner(1, x1, y1)?;
        let corner2 = display_corner(2, x2, y2)?;

        if x1 == x2 || y1 == y2 {
            return Err(ValidationError::DegenerateBoundingBox);
        }

        let product: Product = raw.product.parse()?;
        let resolution: Resolution = raw.resolution.parse()?;

        let native1 = transformer
            .to_native(corner1)
            .map_err(|e| ValidationError::OutsideProjection(e.to_string()))?;
        let native2 = transformer
            .to_native(corner2)
            .map_err(|e| ValidationError::OutsideProjection(e.to_string()))?;
        let bounds = NativeBounds::from_corners(native1, native2)
            .ok_or(ValidationError::DegenerateBoundingBox)?;

        let label = |v: &Option<CoordinateValue>| {
            v.as_ref().map(|v| v.to_string()).unwrap_or_default()
        };

        Ok(Self {
            product,
            resolution,
            bounds,
            corner_labels: [label(&raw.x1), label(&raw.y1), label(&raw.x2), label(&raw.y2)],
        })
    }

    /// File name for the downloaded raster, e.g. `DTM_1.0 m_5.0_52.0_5.1_52.1.tif`
    pub fn download_filename(&self) -> String {
        format!(
            "{}_{}_{}.tif",
            self.product,
            self.resolution,
            self.corner_labels.join("_")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(x1: &str, y1: &str, x2: &str, y2: &str) -> RawExtractionRequest {
        RawExtractionRequest::from_text((x1, y1), (x2, y2), "DTM", "1.0 m")
    }

    #[test]
    fn test_product_parse() {
        assert_eq!("DTM".parse::<Product>().unwrap(), Product::Dtm);
        assert_eq!("DSM".parse::<Product>().unwrap(), Product::Dsm);
        assert_eq!(
            "XYZ".parse::<Product>(),
            Err(ValidationError::InvalidProduct("XYZ".to_string()))
        );
    }

    #[test]
    fn test_resolution_parse_and_gsd() {
        assert_eq!("2.0 m".parse::<Resolution>().unwrap().ground_sample_distance(), 2.0);
        assert_eq!("0.5 m".parse::<Resolution>().unwrap(), Resolution::HalfMetre);
        assert!("3.0 m".parse::<Resolution>().is_err());
        assert!("2".parse::<Resolution>().is_err());

        let mut sorted = Resolution::ALL;
        sorted.sort();
        assert_eq!(sorted, Resolution::ALL);
    }

    #[test]
    fn test_coordinate_value_forms() {
        let text: CoordinateValue = serde_json::from_str("\"5.0\"").unwrap();
        let number: CoordinateValue = serde_json::from_str("5.25").unwrap();
        assert_eq!(text.parse(), Some(5.0));
        assert_eq!(number.parse(), Some(5.25));
        assert_eq!(text.to_string(), "5.0");

        assert_eq!(CoordinateValue::from("abc").parse(), None);
        assert_eq!(CoordinateValue::from("").parse(), None);
        assert_eq!(CoordinateValue::from("inf").parse(), None);
    }

    #[test]
    fn test_build_valid() {
        let transformer = Transformer::rd_new().unwrap();
        let request =
            ExtractionRequest::build(&raw("5.0", "52.0", "5.1", "52.1"), &transformer).unwrap();

        assert_eq!(request.product, Product::Dtm);
        assert_eq!(request.resolution, Resolution::OneMetre);
        assert!(request.bounds.min_x < request.bounds.max_x);
        assert!(request.bounds.min_y < request.bounds.max_y);
        assert_eq!(request.download_filename(), "DTM_1.0 m_5.0_52.0_5.1_52.1.tif");
    }

    #[test]
    fn test_rejects_degenerate_regardless_of_y() {
        let transformer = Transformer::rd_new().unwrap();
        for y2 in ["52.0", "52.1", "51.0"] {
            let err = ExtractionRequest::build(&raw("5.0", "52.0", "5.0", y2), &transformer)
                .unwrap_err();
            assert_eq!(err, ValidationError::DegenerateBoundingBox);
        }

        let err = ExtractionRequest::build(&raw("5.0", "52.0", "5.1", "52.0"), &transformer)
            .unwrap_err();
        assert_eq!(err, ValidationError::DegenerateBoundingBox);
    }

    #[test]
    fn test_accepts_reversed_corners() {
        let transformer = Transformer::rd_new().unwrap();
        let forward =
            ExtractionRequest::build(&raw("5.0", "52.0", "5.1", "52.1"), &transformer).unwrap();
        let reversed =
            ExtractionRequest::build(&raw("5.1", "52.1", "5.0", "52.0"), &transformer).unwrap();
        let mixed =
            ExtractionRequest::build(&raw("5.0", "52.1", "5.1", "52.0"), &transformer).unwrap();

        assert_eq!(forward.bounds, reversed.bounds);
        assert!(mixed.bounds.min_x < mixed.bounds.max_x);
        assert!(mixed.bounds.min_y < mixed.bounds.max_y);
    }

    #[test]
    fn test_validation_order() {
        let transformer = Transformer::rd_new().unwrap();

        // Coordinates are checked before the product
        let mut request = raw("abc", "52.0", "5.1", "52.1");
        request.product = "XYZ".to_string();
        let err = ExtractionRequest::build(&request, &transformer).unwrap_err();
        assert_eq!(err.kind(), "InvalidCoordinates");

        // Degenerate box before product
        let mut request = raw("5.0", "52.0", "5.0", "52.1");
        request.product = "XYZ".to_string();
        let err = ExtractionRequest::build(&request, &transformer).unwrap_err();
        assert_eq!(err, ValidationError::DegenerateBoundingBox);

        // Product before resolution
        let mut request = raw("5.0", "52.0", "5.1", "52.1");
        request.product = "XYZ".to_string();
        request.resolution = "3 m".to_string();
        let err = ExtractionRequest::build(&request, &transformer).unwrap_err();
        assert_eq!(err.kind(), "InvalidProduct");

        let mut request = raw("5.0", "52.0", "5.1", "52.1");
        request.resolution = "3 m".to_string();
        let err = ExtractionRequest::build(&request, &transformer).unwrap_err();
        assert_eq!(err.kind(), "InvalidResolution");
    }

    #[test]
    fn test_missing_and_out_of_range_coordinates() {
        let transformer = Transformer::rd_new().unwrap();
        let mut request = raw("5.0", "52.0", "5.1", "52.1");
        request.y2 = None;
        let err = ExtractionRequest::build(&request, &transformer).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCoordinates("y2 is missing".to_string())
        );

        let err = ExtractionRequest::build(&raw("5.0", "95.0", "5.1", "52.1"), &transformer)
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidCoordinates");
    }

    #[test]
    fn test_outside_projection() {
        let transformer = Transformer::rd_new().unwrap();
        let antipode = raw("-174.55", "-52.06", "-174.5", "-52.0");
        let err = ExtractionRequest::build(&antipode, &transformer)
            .unwrap_err();
        assert_eq!(err.kind(), "OutsideProjection");
    }

    #[test]
    fn test_projwin_order() {
        let bounds = NativeBounds::from_corners(
            Coordinate::new(130_000.0, 450_000.0),
            Coordinate::new(120_000.0, 460_000.0),
        )
        .unwrap();
        assert_eq!(bounds.projwin(), [120_000.0, 460_000.0, 130_000.0, 450_000.0]);
        assert_eq!(bounds.width(), 10_000.0);
        assert_eq!(bounds.height(), 10_000.0);

        let flat = NativeBounds::from_corners(Coordinate::new(1.0, 1.0), Coordinate::new(1.0, 2.0));
        assert!(flat.is_none());
    }

    #[test]
    fn test_deserialize_numbers_and_strings() {
        let request: RawExtractionRequest = serde_json::from_str(
            r#"{"x1":5.0,"y1":"52.0","x2":"5.1","y2":52.1,"product":"DSM","resolution":"0.5 m"}"#,
        )
        .unwrap();
        let built = ExtractionRequest::build(&request, &Transformer::rd_new().unwrap()).unwrap();
        assert_eq!(built.product, Product::Dsm);
        assert_eq!(built.download_filename(), "DSM_0.5 m_5.0_52.0_5.1_52.1.tif");
    }
}
