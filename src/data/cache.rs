//! Table Cache Module
//! Explicit memoization of loaded tables, keyed by path and load options.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::loader::{DataLoadError, DataLoader, LoadOptions};
use super::table::CollisionTable;

/// Memoizes [`DataLoader::load`] results so repeated filter changes do not
/// re-read the CSV.
///
/// The cache is owned and passed by the caller; there is no global instance.
/// Entries are written once per `(path, options)` key and shared read-only
/// as `Arc<CollisionTable>` afterwards.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<(PathBuf, LoadOptions), Arc<CollisionTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for the loader's options, loading it on the
    /// first request for this key.
    pub fn load(
        &mut self,
        loader: &DataLoader,
        path: impl AsRef<Path>,
    ) -> Result<Arc<CollisionTable>, DataLoadError> {
        let key = (path.as_ref().to_path_buf(), loader.options().clone());
        if let Some(table) = self.entries.get(&key) {
            debug!(path = %key.0.display(), "table cache hit");
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(loader.load(&key.0)?);
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
