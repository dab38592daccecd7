//! dem-clipper - interactive bounding box capture and DTM/DSM extraction
//!
//! A user opens one of four drawing tools on a map (points, a polyline, a
//! bounding box or a named place). The bounding box tool yields a raw
//! extraction request, which is validated, transformed into the rasters'
//! reference system (RD New) and clipped out of a cloud-optimised GeoTIFF by
//! `gdal_translate`.
//!
//! # Examples
//!
//! ## Capturing a bounding box
//!
//! ```
//! use dem_clipper::capture::{InMemoryMap, MapEvent, Point, ToolArbiter, ToolKind};
//! use dem_clipper::extraction::ExtractionRequest;
//! use dem_clipper::projection::Transformer;
//!
//! let mut arbiter = ToolArbiter::new(InMemoryMap::new());
//! arbiter.activate(ToolKind::BoundingBox);
//! arbiter.dispatch(&MapEvent::Click(Point::new(5.0, 52.0)));
//! arbiter.dispatch(&MapEvent::Click(Point::new(5.1, 52.1)));
//!
//! let raw = arbiter.confirm().expect("both corners placed");
//! let request = ExtractionRequest::build(&raw, &Transformer::rd_new()?)?;
//! assert!(request.bounds.width() > 0.0);
//! # Ok::<(), dem_clipper::Error>(())
//! ```
//!
//! ## Projecting a coordinate
//!
//! ```
//! use dem_clipper::{Coordinate, Transformer};
//!
//! let transformer = Transformer::rd_new()?;
//! let rd = transformer.to_native(Coordinate::from_lonlat(5.38763888888889, 52.15616055555555))?;
//! assert!((rd.x - 155_000.0).abs() < 1e-3);
//! assert!((rd.y - 463_000.0).abs() < 1e-3);
//! # Ok::<(), dem_clipper::Error>(())
//! ```

pub mod error;
pub mod projection;
pub mod place;
pub mod capture;
pub mod extraction;
pub mod config;
pub mod api;

pub use error::{Error, Result};
pub use config::Config;
pub use projection::{Coordinate, Transformer};
pub use extraction::{ExtractionRequest, Extractor, Product, RawExtractionRequest, Resolution};
pub use place::{Geometry, PlaceResolver};
pub use capture::{ToolArbiter, ToolKind};
