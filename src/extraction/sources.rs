//! Mapping from product selector to source raster file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::extraction::request::Product;

/// Configured location of each product's cloud-optimised GeoTIFF
#[derive(Debug, Clone, Default)]
pub struct ProductSources {
    base_dir: PathBuf,
    files: BTreeMap<Product, PathBuf>,
}

impl ProductSources {
    /// Creates a mapping whose relative file names resolve against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            files: BTreeMap::new(),
        }
    }

    /// Registers the file for one product
    pub fn with_file(mut self, product: Product, file: impl Into<PathBuf>) -> Self {
        self.files.insert(product, file.into());
        self
    }

    /// Full configured path for a product, whether or not it exists
    pub fn path_for(&self, product: Product) -> Option<PathBuf> {
        self.files.get(&product).map(|file| self.base_dir.join(file))
    }

    /// Resolves a product to an existing file or fails with `SourceNotFound`
    pub async fn resolve(&self, product: Product) -> Result<PathBuf> {
        let path = self
            .path_for(product)
            .unwrap_or_else(|| self.base_dir.join(format!("{}.tif", product)));

        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(Error::SourceNotFound(path));
        }
        debug!("Using local COG for {}: {}", product, path.display());
        Ok(path)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
