//! Error types for dem-clipper

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for dem-clipper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while capturing, transforming or extracting
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Malformed client input
    Validation(ValidationError),

    /// The configured source raster for a product does not exist
    SourceNotFound(PathBuf),

    /// No place matched the requested name
    PlaceNotFound(String),

    /// The external clipping tool could not produce a raster
    ExternalTool(ToolFailure),

    /// The clipping tool exited cleanly but wrote nothing
    OutputMissing(PathBuf),

    /// Coordinate outside the projection domain or transform failure
    Projection(String),

    /// Invalid or unreadable configuration
    Config(String),

    /// The place store could not be queried or parsed
    Store(String),
}

impl Error {
    /// Returns true for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Returns true for errors that map to "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SourceNotFound(_) | Error::PlaceNotFound(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Validation(e) => write!(f, "{}", e),
            Error::SourceNotFound(path) => write!(f, "Source raster not found: {}", path.display()),
            Error::PlaceNotFound(name) => write!(f, "Municipality not found: {}", name),
            Error::ExternalTool(e) => write!(f, "{}", e),
            Error::OutputMissing(path) => {
                write!(f, "gdal_translate completed but output file not found: {}", path.display())
            }
            Error::Projection(msg) => write!(f, "Projection error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Store(msg) => write!(f, "Place store error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::ExternalTool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        Error::Validation(error)
    }
}

impl From<ToolFailure> for Error {
    fn from(error: ToolFailure) -> Self {
        Error::ExternalTool(error)
    }
}

/// Reasons an extraction request is rejected before any work is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A coordinate field is missing, non-numeric or out of range
    InvalidCoordinates(String),

    /// The two corners share an x or a y value
    DegenerateBoundingBox,

    /// Unknown product selector
    InvalidProduct(String),

    /// Unknown resolution selector
    InvalidResolution(String),

    /// A corner cannot be represented in the raster's reference system
    OutsideProjection(String),
}

impl ValidationError {
    /// Stable machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidCoordinates(_) => "InvalidCoordinates",
            ValidationError::DegenerateBoundingBox => "DegenerateBoundingBox",
            ValidationError::InvalidProduct(_) => "InvalidProduct",
            ValidationError::InvalidResolution(_) => "InvalidResolution",
            ValidationError::OutsideProjection(_) => "OutsideProjection",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCoordinates(msg) => write!(f, "Invalid coordinates: {}", msg),
            ValidationError::DegenerateBoundingBox => {
                write!(f, "Bounding box must have non-zero width and height")
            }
            ValidationError::InvalidProduct(p) => {
                write!(f, "Invalid product '{}': expected DTM or DSM", p)
            }
            ValidationError::InvalidResolution(r) => write!(f, "Invalid resolution '{}'", r),
            ValidationError::OutsideProjection(msg) => {
                write!(f, "Coordinates outside the raster projection: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Ways the external clipping process can fail
#[derive(Debug)]
pub enum ToolFailure {
    /// The process could not be started (e.g. GDAL not installed)
    Spawn { program: String, source: io::Error },

    /// The process ran and exited unsuccessfully
    Exit { code: Option<i32>, diagnostics: String },

    /// The process did not finish in time and was killed
    Timeout { after: Duration },
}

impl ToolFailure {
    /// Exit code of the process, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ToolFailure::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFailure::Spawn { program, source } => write!(
                f,
                "Failed to spawn {}: {}. Is GDAL installed?",
                program, source
            ),
            ToolFailure::Exit { code: Some(code), diagnostics } => {
                write!(f, "gdal_translate failed with code {}: {}", code, diagnostics.trim())
            }
            ToolFailure::Exit { code: None, diagnostics } => {
                write!(f, "gdal_translate terminated by signal: {}", diagnostics.trim())
            }
            ToolFailure::Timeout { after } => write!(
                f,
                "gdal_translate timed out after {:.1} s and was terminated",
                after.as_secs_f64()
            ),
        }
    }
}

impl std::error::Error for ToolFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolFailure::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}
