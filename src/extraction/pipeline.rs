//! Runs the external clipping tool and returns the clipped raster

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::error::{Error, Result, ToolFailure};
use crate::extraction::command::ClipCommand;
use crate::extraction::request::ExtractionRequest;
use crate::extraction::scratch::ScratchArtifact;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How and where the clipping tool runs
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// `gdal_translate` executable
    pub program: PathBuf,
    /// Forwarded to the child as `GDAL_DATA` when set
    pub gdal_data: Option<PathBuf>,
    /// Parent of the per-request scratch directories
    pub scratch_dir: PathBuf,
    pub timeout: Duration,
    /// Upper bound on concurrently running clipping processes
    pub max_concurrent: usize,
}

impl ExtractorSettings {
    /// Defaults: `gdal_translate` from `PATH`, 60 s timeout, one process per core
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("gdal_translate"),
            gdal_data: None,
            scratch_dir: scratch_dir.into(),
            timeout: DEFAULT_TIMEOUT,
            max_concurrent: default_concurrency(),
        }
    }
}

/// Number of available cores, or 1 if that cannot be determined
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Clips source rasters with a bounded number of concurrent tool invocations
#[derive(Debug)]
pub struct Extractor {
    settings: ExtractorSettings,
    permits: Semaphore,
}

impl Extractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        let permits = Semaphore::new(settings.max_concurrent.clamp(1, Semaphore::MAX_PERMITS));
        Self { settings, permits }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Clips `source` to the request and returns the GeoTIFF bytes
    ///
    /// The output is written to a fresh scratch directory that is removed
    /// before this returns, whether the extraction succeeded or not.
    pub async fn extract(&self, source: &Path, request: &ExtractionRequest) -> Result<Vec<u8>> {
        let is_file = tokio::fs::metadata(source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(Error::SourceNotFound(source.to_path_buf()));
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        let start = Instant::now();
        let artifact = ScratchArtifact::create(&self.settings.scratch_dir).await?;
        let command = ClipCommand::new(
            &self.settings.program,
            source,
            artifact.output_path(),
            request,
        );

        let outcome = match self.run(&command).await {
            Ok(()) => artifact.read().await,
            Err(e) => Err(e),
        };
        artifact.close().await;
        let bytes = outcome?;

        info!(
            "Extracted {} {} ({:.2} KB) in {:.0} ms",
            request.product,
            request.resolution,
            bytes.len() as f64 / 1024.0,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(bytes)
    }

    async fn run(&self, command: &ClipCommand) -> Result<()> {
        debug!("Running {}", command.display());

        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(gdal_data) = &self.settings.gdal_data {
            process.env("GDAL_DATA", gdal_data);
        }

        let child = process.spawn().map_err(|source| ToolFailure::Spawn {
            program: command.program().display().to_string(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = tokio::time::timeout(self.settings.timeout, child.wait_with_output()).await;
        let output = match waited {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    "gdal_translate exceeded {:?}, terminating",
                    self.settings.timeout
                );
                return Err(ToolFailure::Timeout {
                    after: self.settings.timeout,
                }
                .into());
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            // GDAL reports progress on stderr as well as errors
            debug!("GDAL stderr: {}", stderr.trim());
        }

        if !output.status.success() {
            let diagnostics = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).into_owned()
            } else {
                stderr.into_owned()
            };
            error!(
                "gdal_translate failed with code {:?}: {}",
                output.status.code(),
                diagnostics.trim()
            );
            return Err(ToolFailure::Exit {
                code: output.status.code(),
                diagnostics,
            }
            .into());
        }

        Ok(())
    }
}
