use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::extraction::{Extractor, ProductSources};
use crate::place::{PlaceResolver, PlaceStore};
use crate::projection::Transformer;

/// Everything a request handler needs, shared read-only across requests
pub struct AppState {
    pub transformer: Transformer,
    pub sources: ProductSources,
    pub extractor: Extractor,
    pub places: PlaceResolver,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        transformer: Transformer,
        sources: ProductSources,
        extractor: Extractor,
        store: Arc<dyn PlaceStore>,
    ) -> Self {
        Self {
            places: PlaceResolver::new(store, transformer.clone()),
            transformer,
            sources,
            extractor,
        }
    }

    /// Builds the state described by a configuration, loading the boundary file
    pub fn from_config(config: &Config) -> Result<Self> {
        let transformer = Transformer::rd_new()?;
        let store = config.place_store()?;
        Ok(Self::new(
            transformer,
            config.product_sources(),
            Extractor::new(config.extractor_settings()),
            Arc::new(store),
        ))
    }
}
