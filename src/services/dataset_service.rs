use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::debuts::{self, DebutTable};
use crate::error::DashboardError;
use crate::importers::downloader::FileFetcher;
use crate::importers::excel_importer::ExcelImporter;

/// Cache key: where the workbook lives and which version of it we want
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub source: String,
    pub version: String,
}

impl DatasetKey {
    pub fn new(source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: version.into(),
        }
    }
}

/// Loads the debut workbook once per (source, version) and hands out
/// shared read-only tables.
#[derive(Clone)]
pub struct DatasetService {
    fetcher: Arc<dyn FileFetcher>,
    sheet_name: String,
    cache: Arc<Mutex<HashMap<DatasetKey, Arc<DebutTable>>>>,
}

impl DatasetService {
    pub fn new(fetcher: Arc<dyn FileFetcher>, sheet_name: impl Into<String>) -> Self {
        Self {
            fetcher,
            sheet_name: sheet_name.into(),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the cached table for `key`, fetching and normalizing on a miss.
    ///
    /// The cache lock is held across the fetch so concurrent misses for the
    /// same key download once.
    #[instrument(skip(self), fields(source = %key.source, version = %key.version))]
    pub async fn load(&self, key: &DatasetKey) -> Result<Arc<DebutTable>, DashboardError> {
        let mut cache = self.cache.lock().await;
        if let Some(table) = cache.get(key) {
            debug!("Serving {} debut records from cache", table.len());
            return Ok(Arc::clone(table));
        }

        let bytes = self.fetcher.fetch(&key.source).await.map_err(|e| {
            error!("Failed to download workbook: {}", e);
            DashboardError::from(e)
        })?;

        let importer = ExcelImporter::new(self.sheet_name.clone());
        let raw = importer.parse_bytes(bytes).map_err(|e| {
            error!("Failed to read workbook: {}", e);
            DashboardError::from(e)
        })?;

        let table = Arc::new(debuts::prepare(&raw));
        info!("Loaded {} debut records", table.len());

        cache.insert(key.clone(), Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table for `key`; the next load re-fetches.
    pub async fn invalidate(&self, key: &DatasetKey) -> bool {
        let removed = self.cache.lock().await.remove(key).is_some();
        if removed {
            info!("Invalidated cached dataset {} ({})", key.source, key.version);
        }
        removed
    }

    pub async fn is_cached(&self, key: &DatasetKey) -> bool {
        self.cache.lock().await.contains_key(key)
    }
}
