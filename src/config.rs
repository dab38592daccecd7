//! Service configuration
//!
//! Loaded from a TOML file where every key is optional, then overridden by the
//! `PORT`, `GDAL_BIN_PATH` and `GDAL_DATA` environment variables.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:3000"
//! static_dir = "public"
//!
//! [extraction]
//! scratch_dir = "temp"
//! timeout_secs = 60
//!
//! [products]
//! base_dir = "testCOG"
//! DTM = "DTM_outputtest_COG.TIF"
//! DSM = "DSM_outputtest_COG.tif"
//!
//! [places]
//! boundaries = "municipalities.geojson"
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::extraction::{locate_gdal_translate, ExtractorSettings, Product, ProductSources};
use crate::place::GeoJsonPlaceStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
    pub products: ProductsConfig,
    pub places: PlacesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Front-end directory served for unmatched routes
    pub static_dir: Option<PathBuf>,
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            static_dir: None,
            body_limit_mb: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub gdal_translate: PathBuf,
    /// Directory holding `gdal_translate`; wins over `gdal_translate` when the file exists
    pub gdal_bin_path: Option<PathBuf>,
    pub gdal_data: Option<PathBuf>,
    pub scratch_dir: PathBuf,
    pub timeout_secs: u64,
    /// Defaults to the number of available cores
    pub max_concurrent: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            gdal_translate: PathBuf::from("gdal_translate"),
            gdal_bin_path: None,
            gdal_data: None,
            scratch_dir: PathBuf::from("temp"),
            timeout_secs: 60,
            max_concurrent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductsConfig {
    pub base_dir: PathBuf,
    #[serde(rename = "DTM")]
    pub dtm: PathBuf,
    #[serde(rename = "DSM")]
    pub dsm: PathBuf,
}

impl Default for ProductsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("testCOG"),
            dtm: PathBuf::from("DTM_outputtest_COG.TIF"),
            dsm: PathBuf::from("DSM_outputtest_COG.tif"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// GeoJSON FeatureCollection of boundaries in the native system
    pub boundaries: Option<PathBuf>,
    pub name_property: String,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            boundaries: None,
            name_property: GeoJsonPlaceStore::DEFAULT_NAME_PROPERTY.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reads the file if one is given, applies environment overrides and validates
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `PORT`, `GDAL_BIN_PATH` and `GDAL_DATA` from `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: '{}'", port)))?;
            let host = self
                .server
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            self.server.bind = format!("{}:{}", host, port);
            debug!("PORT override, binding {}", self.server.bind);
        }
        if let Some(dir) = lookup("GDAL_BIN_PATH").filter(|d| !d.is_empty()) {
            self.extraction.gdal_bin_path = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("GDAL_DATA").filter(|d| !d.is_empty()) {
            self.extraction.gdal_data = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.extraction.timeout_secs == 0 {
            return Err(Error::Config("extraction.timeout_secs must be positive".to_string()));
        }
        match self.extraction.max_concurrent {
            Some(0) => {
                return Err(Error::Config("extraction.max_concurrent must be positive".to_string()));
            }
            Some(n) if n > Semaphore::MAX_PERMITS => {
                return Err(Error::Config(format!(
                    "extraction.max_concurrent must be at most {}",
                    Semaphore::MAX_PERMITS
                )));
            }
            _ => {}
        }
        if self.server.body_limit_mb == 0 {
            return Err(Error::Config("server.body_limit_mb must be positive".to_string()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| {
                Error::Config(format!("Invalid bind address '{}': {}", self.server.bind, e))
            })
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.server.body_limit_mb * 1024 * 1024
    }

    pub fn product_sources(&self) -> ProductSources {
        ProductSources::new(&self.products.base_dir)
            .with_file(Product::Dtm, &self.products.dtm)
            .with_file(Product::Dsm, &self.products.dsm)
    }

    pub fn extractor_settings(&self) -> ExtractorSettings {
        let mut settings = ExtractorSettings::new(&self.extraction.scratch_dir);
        settings.program = locate_gdal_translate(
            &self.extraction.gdal_translate,
            self.extraction.gdal_bin_path.as_deref(),
        );
        settings.gdal_data = self.extraction.gdal_data.clone();
        settings.timeout = Duration::from_secs(self.extraction.timeout_secs);
        if let Some(max) = self.extraction.max_concurrent {
            settings.max_concurrent = max;
        }
        settings
    }

    /// Boundary store from `[places] boundaries`, or an empty one
    pub fn place_store(&self) -> Result<GeoJsonPlaceStore> {
        match &self.places.boundaries {
            Some(path) => GeoJsonPlaceStore::load(path, &self.places.name_property),
            None => {
                info!("No place boundaries configured; place lookups will not match");
                Ok(GeoJsonPlaceStore::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
        assert_eq!(config.extraction.timeout_secs, 60);
        assert_eq!(
            config.product_sources().path_for(Product::Dtm),
            Some(PathBuf::from("testCOG/DTM_outputtest_COG.TIF"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [extraction]
            timeout_secs = 5
            max_concurrent = 2

            [products]
            base_dir = "/data/cog"
            DSM = "dsm.tif"
            "#,
        )
        .unwrap();

        assert_eq!(config.extraction.timeout_secs, 5);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.products.dtm, PathBuf::from("DTM_outputtest_COG.TIF"));

        let settings = config.extractor_settings();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.max_concurrent, 2);
        assert_eq!(
            config.product_sources().path_for(Product::Dsm),
            Some(PathBuf::from("/data/cog/dsm.tif"))
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[server\nbind = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.server.bind = "127.0.0.1:3000".to_string();
        config
            .apply_env(env(&[("PORT", "8080"), ("GDAL_DATA", "/usr/share/gdal")]))
            .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.extraction.gdal_data, Some(PathBuf::from("/usr/share/gdal")));
        assert_eq!(config.extraction.gdal_bin_path, None);

        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.extraction.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction.max_concurrent = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction.max_concurrent = Some(usize::MAX);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.extraction.max_concurrent = Some(Semaphore::MAX_PERMITS);
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.server.bind = "not an address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_boundaries_file() {
        let mut config = Config::default();
        assert!(config.place_store().unwrap().is_empty());

        config.places.boundaries = Some(PathBuf::from("/nonexistent/places.geojson"));
        assert!(config.place_store().is_err());
    }
}
