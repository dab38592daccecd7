//! GeoJSON geometry objects

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::projection::Coordinate;

/// GeoJSON position: x, y and optional extra ordinates
pub type Position = Vec<f64>;

/// A GeoJSON geometry object
///
/// Serialised as `{"type": "...", "coordinates": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// Axis-aligned extent of a geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl Bounds {
    fn around(coord: Coordinate) -> Self {
        Self { min: coord, max: coord }
    }

    fn include(&mut self, coord: Coordinate) {
        self.min.x = self.min.x.min(coord.x);
        self.min.y = self.min.y.min(coord.y);
        self.max.x = self.max.x.max(coord.x);
        self.max.y = self.max.y.max(coord.y);
    }
}

fn position_coordinate(position: &[f64]) -> Result<Coordinate> {
    match position {
        [x, y, ..] => Ok(Coordinate::new(*x, *y)),
        _ => Err(Error::Projection(format!(
            "position needs at least two ordinates, got {}",
            position.len()
        ))),
    }
}

fn map_position<F>(position: &[f64], f: &F) -> Result<Position>
where
    F: Fn(Coordinate) -> Result<Coordinate>,
{
    let mapped = f(position_coordinate(position)?)?;
    let mut out = vec![mapped.x, mapped.y];
    out.extend_from_slice(&position[2..]);
    Ok(out)
}

fn map_positions<F>(positions: &[Position], f: &F) -> Result<Vec<Position>>
where
    F: Fn(Coordinate) -> Result<Coordinate>,
{
    positions.iter().map(|p| map_position(p, f)).collect()
}

fn map_rings<F>(rings: &[Vec<Position>], f: &F) -> Result<Vec<Vec<Position>>>
where
    F: Fn(Coordinate) -> Result<Coordinate>,
{
    rings.iter().map(|ring| map_positions(ring, f)).collect()
}

impl Geometry {
    /// Open path through the given points
    pub fn line_string(points: &[Coordinate]) -> Self {
        Geometry::LineString(points.iter().map(|p| p.to_position()).collect())
    }

    /// Closed rectangle spanned by two opposite corners, in any order
    pub fn rectangle(a: Coordinate, b: Coordinate) -> Self {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        Geometry::Polygon(vec![vec![
            vec![min_x, min_y],
            vec![max_x, min_y],
            vec![max_x, max_y],
            vec![min_x, max_y],
            vec![min_x, min_y],
        ]])
    }

    /// Polygon without rings
    pub fn empty_polygon() -> Self {
        Geometry::Polygon(Vec::new())
    }

    /// GeoJSON type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Applies a fallible coordinate transform to every position
    ///
    /// Extra ordinates (e.g. elevation) are carried over unchanged.
    pub fn try_map<F>(&self, f: F) -> Result<Geometry>
    where
        F: Fn(Coordinate) -> Result<Coordinate>,
    {
        Ok(match self {
            Geometry::Point(p) => Geometry::Point(map_position(p, &f)?),
            Geometry::MultiPoint(ps) => Geometry::MultiPoint(map_positions(ps, &f)?),
            Geometry::LineString(ps) => Geometry::LineString(map_positions(ps, &f)?),
            Geometry::MultiLineString(ls) => Geometry::MultiLineString(map_rings(ls, &f)?),
            Geometry::Polygon(rings) => Geometry::Polygon(map_rings(rings, &f)?),
            Geometry::MultiPolygon(polys) => Geometry::MultiPolygon(
                polys
                    .iter()
                    .map(|rings| map_rings(rings, &f))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// All positions in document order
    pub fn coordinates(&self) -> Vec<Coordinate> {
        let mut out = Vec::new();
        let mut push = |ps: &[Position]| {
            out.extend(ps.iter().filter_map(|p| position_coordinate(p).ok()));
        };
        match self {
            Geometry::Point(p) => push(std::slice::from_ref(p)),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => push(ps),
            Geometry::MultiLineString(ls) | Geometry::Polygon(ls) => {
                ls.iter().for_each(|l| push(l))
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().for_each(|l| push(l)),
        }
        out
    }

    /// Extent of all positions, or `None` for an empty geometry
    pub fn bounds(&self) -> Option<Bounds> {
        let mut coords = self.coordinates().into_iter();
        let mut bounds = Bounds::around(coords.next()?);
        coords.for_each(|c| bounds.include(c));
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geojson_shape() {
        let geometry = Geometry::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]);
        let json = serde_json::to_value(&geometry).unwrap();
        assert_eq!(json["type"], "Polygon");
        assert_eq!(json["coordinates"][0][1][0], 1.0);

        let parsed: Geometry =
            serde_json::from_str(r#"{"type":"MultiPolygon","coordinates":[[[[1,2],[3,4],[1,2]]]]}"#)
                .unwrap();
        assert_eq!(parsed.type_name(), "MultiPolygon");
    }

    #[test]
    fn test_bounds() {
        let geometry = Geometry::MultiPolygon(vec![
            vec![vec![vec![1.0, 5.0], vec![2.0, 6.0], vec![1.0, 5.0]]],
            vec![vec![vec![-3.0, 4.0], vec![0.0, 9.0], vec![-3.0, 4.0]]],
        ]);
        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.min, Coordinate::new(-3.0, 4.0));
        assert_eq!(bounds.max, Coordinate::new(2.0, 9.0));
        assert!(Geometry::empty_polygon().bounds().is_none());
    }

    #[test]
    fn test_rectangle_normalises_corners() {
        let a = Geometry::rectangle(Coordinate::new(5.1, 52.0), Coordinate::new(5.0, 52.1));
        let b = Geometry::rectangle(Coordinate::new(5.0, 52.1), Coordinate::new(5.1, 52.0));
        assert_eq!(a, b);
        match a {
            Geometry::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][0], rings[0][4]);
                assert_eq!(rings[0][0], vec![5.0, 52.0]);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_try_map_keeps_extra_ordinates() {
        let geometry = Geometry::LineString(vec![vec![1.0, 2.0, 30.0], vec![3.0, 4.0]]);
        let shifted = geometry
            .try_map(|c| Ok(Coordinate::new(c.x + 10.0, c.y)))
            .unwrap();
        assert_eq!(
            shifted,
            Geometry::LineString(vec![vec![11.0, 2.0, 30.0], vec![13.0, 4.0]])
        );

        let short = Geometry::Point(vec![1.0]);
        assert!(short.try_map(Ok).is_err());
    }
}
