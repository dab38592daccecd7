//! Bounded raster extraction
//!
//! Raw client input is validated and transformed by [`ExtractionRequest::build`],
//! the product's source raster is resolved through [`ProductSources`], and the
//! [`Extractor`] clips it with `gdal_translate` inside a per-request scratch
//! directory.

pub mod command;
pub mod pipeline;
pub mod request;
pub mod scratch;
pub mod sources;

pub use command::{locate_gdal_translate, ClipCommand};
pub use pipeline::{Extractor, ExtractorSettings};
pub use request::{
    CoordinateValue, ExtractionRequest, NativeBounds, Product, RawExtractionRequest, Resolution,
};
pub use scratch::ScratchArtifact;
pub use sources::ProductSources;
