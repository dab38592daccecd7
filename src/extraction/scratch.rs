//! Per-request scratch space for clipped rasters

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::TempDir;

use crate::error::{Error, Result};

const OUTPUT_NAME: &str = "extract.tif";

/// A uniquely named directory holding one extraction's output raster
///
/// The directory and everything in it is removed when the artifact is
/// dropped, so its lifetime never outlives the request that created it.
#[derive(Debug)]
pub struct ScratchArtifact {
    dir: TempDir,
    output: PathBuf,
}

impl ScratchArtifact {
    /// Creates a fresh directory under `root`, creating `root` on demand
    pub async fn create(root: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let root = root.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("bbox_extract_")
                .tempdir_in(&root)
        })
        .await
        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e)))??;
        let output = dir.path().join(OUTPUT_NAME);
        debug!("Created scratch directory {}", dir.path().display());

        Ok(Self { dir, output })
    }

    /// Where the clipping tool should write its result
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Reads the output raster, failing with `OutputMissing` if nothing was written
    pub async fn read(&self) -> Result<Vec<u8>> {
        match tokio::fs::read(&self.output).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::OutputMissing(self.output.clone()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Removes the scratch directory now, logging rather than failing on error
    pub async fn close(self) {
        let path = self.dir.path().to_path_buf();
        let dir = self.dir;
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => debug!("Cleaned up scratch directory {}", path.display()),
            Ok(Err(e)) => warn!("Failed to delete scratch directory {}: {}", path.display(), e),
            Err(e) => warn!("Cleanup of {} did not finish: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_create_on_demand_and_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let scratch_root = root.path().join("temp").join("nested");

        let artifact = ScratchArtifact::create(&scratch_root).await.unwrap();
        assert!(scratch_root.is_dir());
        assert!(artifact.dir().starts_with(&scratch_root));
        fs::write(artifact.output_path(), b"raster").unwrap();

        let dir = artifact.dir().to_path_buf();
        artifact.close().await;
        assert!(!dir.exists());
        assert_eq!(fs::read_dir(&scratch_root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = {
            let artifact = ScratchArtifact::create(root.path()).await.unwrap();
            fs::write(artifact.output_path(), b"raster").unwrap();
            artifact.dir().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchArtifact::create(root.path()).await.unwrap();
        let b = ScratchArtifact::create(root.path()).await.unwrap();
        assert_ne!(a.output_path(), b.output_path());
    }

    #[tokio::test]
    async fn test_read_missing_output() {
        let root = tempfile::tempdir().unwrap();
        let artifact = ScratchArtifact::create(root.path()).await.unwrap();
        let err = artifact.read().await.unwrap_err();
        assert!(matches!(err, Error::OutputMissing(_)));
    }
}
