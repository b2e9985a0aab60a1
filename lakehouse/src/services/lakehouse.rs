use common::Result;
use common::config::{QueryConfig, Settings};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{FsSourceCatalog, MetadataDescriptor, SourceCatalog, describe};
use crate::processor::{FilterRequest, QueryEngine, QueryResult};

/// Read-side facade used by the HTTP handlers.
pub struct LakehouseService {
    catalog: Arc<dyn SourceCatalog>,
    engine: QueryEngine,
    default_limit: usize,
}

impl LakehouseService {
    pub fn new(settings: &Settings) -> Self {
        let root = settings.paths.processed_dir.clone();
        let catalog = Arc::new(FsSourceCatalog::new(root.clone()));
        Self::with_catalog(root, catalog, settings.query.clone())
    }

    pub fn with_catalog(
        root: impl Into<PathBuf>,
        catalog: Arc<dyn SourceCatalog>,
        config: QueryConfig,
    ) -> Self {
        let default_limit = config.default_limit;
        Self {
            engine: QueryEngine::new(root, Arc::clone(&catalog), config),
            catalog,
            default_limit,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub async fn list_sources(&self) -> Result<Vec<String>> {
        self.catalog.list().await
    }

    pub async fn sources_with_metadata(&self) -> Result<BTreeMap<String, MetadataDescriptor>> {
        let sources = self.catalog.list().await?;
        Ok(sources
            .into_iter()
            .map(|name| {
                let descriptor = describe(&name);
                (name, descriptor)
            })
            .collect())
    }

    pub async fn query(&self, request: &FilterRequest) -> Result<QueryResult> {
        self.engine.query(request).await
    }
}
