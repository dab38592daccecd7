//! Argument construction for `gdal_translate`

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::warn;

use crate::extraction::request::ExtractionRequest;

/// Creation options for a compressed, tiled GeoTIFF
const CREATION_OPTIONS: [&str; 4] = [
    "COMPRESS=LZW",
    "TILED=YES",
    "BLOCKXSIZE=256",
    "BLOCKYSIZE=256",
];

/// One invocation of the external clipping tool
#[derive(Debug, Clone)]
pub struct ClipCommand {
    program: PathBuf,
    input: PathBuf,
    output: PathBuf,
    projwin: [f64; 4],
    ground_sample_distance: f64,
}

impl ClipCommand {
    /// Builds the invocation that clips `input` to the request's bounds
    pub fn new(program: &Path, input: &Path, output: &Path, request: &ExtractionRequest) -> Self {
        Self {
            program: program.to_path_buf(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            projwin: request.bounds.projwin(),
            ground_sample_distance: request.resolution.ground_sample_distance(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments after the program name
    ///
    /// `-projwin` takes upper-left x/y then lower-right x/y, i.e.
    /// minX maxY maxX minY in a north-up system.
    pub fn args(&self) -> Vec<OsString> {
        let gsd = self.ground_sample_distance.to_string();
        let mut args: Vec<OsString> = vec![
            self.input.clone().into_os_string(),
            self.output.clone().into_os_string(),
            OsString::from("-projwin"),
        ];
        for value in self.projwin {
            args.push(OsString::from(value.to_string()));
        }
        args.push(OsString::from("-tr"));
        args.push(OsString::from(&gsd));
        args.push(OsString::from(&gsd));
        args.push(OsString::from("-of"));
        args.push(OsString::from("GTiff"));
        for option in CREATION_OPTIONS {
            args.push(OsString::from("-co"));
            args.push(OsString::from(option));
        }
        args
    }

    /// The command line as one string, for logging
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args().iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Resolves the `gdal_translate` executable
///
/// A `GDAL_BIN_PATH` directory wins when the executable actually exists there;
/// otherwise the configured program is used as-is (usually found on `PATH`).
pub fn locate_gdal_translate(configured: &Path, gdal_bin_path: Option<&Path>) -> PathBuf {
    if let Some(dir) = gdal_bin_path {
        let name = if cfg!(windows) { "gdal_translate.exe" } else { "gdal_translate" };
        let candidate = dir.join(name);
        if candidate.is_file() {
            return candidate;
        }
        warn!(
            "GDAL not found at {}, falling back to {}",
            candidate.display(),
            configured.display()
        );
    }
    configured.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::request::RawExtractionRequest;
    use crate::projection::{Coordinate, Transformer};

    fn strings(command: &ClipCommand) -> Vec<String> {
        command
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_args_for_every_corner_ordering() {
        let transformer = Transformer::rd_new().unwrap();
        let orderings = [
            (("5.0", "52.0"), ("5.1", "52.1")),
            (("5.1", "52.1"), ("5.0", "52.0")),
            (("5.0", "52.1"), ("5.1", "52.0")),
            (("5.1", "52.0"), ("5.0", "52.1")),
        ];

        for (c1, c2) in orderings {
            let raw = RawExtractionRequest::from_text(c1, c2, "DTM", "2.0 m");
            let request = ExtractionRequest::build(&raw, &transformer).unwrap();
            let command = ClipCommand::new(
                Path::new("gdal_translate"),
                Path::new("/data/dtm.tif"),
                Path::new("/tmp/out.tif"),
                &request,
            );
            let args = strings(&command);

            assert_eq!(args[0], "/data/dtm.tif");
            assert_eq!(args[1], "/tmp/out.tif");
            assert_eq!(args[2], "-projwin");

            let corner = |(x, y): (&str, &str)| {
                transformer
                    .to_native(Coordinate::from_lonlat(x.parse().unwrap(), y.parse().unwrap()))
                    .unwrap()
            };
            let (a, b) = (corner(c1), corner(c2));
            let expected = [a.x.min(b.x), a.y.max(b.y), a.x.max(b.x), a.y.min(b.y)];

            let projwin: Vec<f64> = args[3..7].iter().map(|a| a.parse().unwrap()).collect();
            assert_eq!(projwin, expected.to_vec());
            assert!(projwin[0] < projwin[2], "upper-left x must be minX");
            assert!(projwin[1] > projwin[3], "upper-left y must be maxY");

            assert_eq!(&args[7..10], &["-tr", "2", "2"]);
        }
    }

    #[test]
    fn test_creation_options() {
        let raw = RawExtractionRequest::from_text(("5.0", "52.0"), ("5.1", "52.1"), "DSM", "0.5 m");
        let request = ExtractionRequest::build(&raw, &Transformer::rd_new().unwrap()).unwrap();
        let command = ClipCommand::new(
            Path::new("gdal_translate"),
            Path::new("in.tif"),
            Path::new("out.tif"),
            &request,
        );
        let args = strings(&command);

        assert_eq!(&args[7..10], &["-tr", "0.5", "0.5"]);
        assert_eq!(&args[10..12], &["-of", "GTiff"]);
        assert!(args.windows(2).any(|w| w == ["-co", "COMPRESS=LZW"]));
        assert!(args.windows(2).any(|w| w == ["-co", "TILED=YES"]));
        assert!(command.display().starts_with("gdal_translate in.tif out.tif -projwin"));
    }

    #[test]
    fn test_locate_falls_back_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let located = locate_gdal_translate(Path::new("gdal_translate"), Some(dir.path()));
        assert_eq!(located, PathBuf::from("gdal_translate"));

        let located = locate_gdal_translate(Path::new("/opt/gdal/bin/gdal_translate"), None);
        assert_eq!(located, PathBuf::from("/opt/gdal/bin/gdal_translate"));
    }

    #[test]
    fn test_locate_prefers_bin_path() {
        let dir = tempfile::tempdir().unwrap();
        let name = if cfg!(windows) { "gdal_translate.exe" } else { "gdal_translate" };
        std::fs::write(dir.path().join(name), b"").unwrap();

        let located = locate_gdal_translate(Path::new("gdal_translate"), Some(dir.path()));
        assert_eq!(located, dir.path().join(name));
    }
}
