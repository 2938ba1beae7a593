use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::SystemTime;

use super::loader::{load_file, DataLoadError};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Memoized loading keyed by path + modification time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
}

/// Keeps every successfully loaded dataset for the lifetime of the cache.
///
/// A file whose modification time changes is parsed again under a new key;
/// entries are never evicted. Failed loads are not cached.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<CacheKey, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, parsing the file on a miss.
    pub fn load(&self, path: &Path) -> Result<Arc<Dataset>, DataLoadError> {
        let io_err = |source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let metadata = std::fs::metadata(path).map_err(io_err)?;
        let key = CacheKey {
            path: path.canonicalize().map_err(io_err)?,
            modified: metadata.modified().ok(),
        };

        if let Some(dataset) = self.lock().get(&key) {
            log::debug!("Dataset cache hit for {}", path.display());
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load_file(path)?);
        self.lock().insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Number of cached datasets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<Dataset>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide memoized load.
pub fn load(path: &Path) -> Result<Arc<Dataset>, DataLoadError> {
    static CACHE: OnceLock<DatasetCache> = OnceLock::new();
    CACHE.get_or_init(DatasetCache::new).load(path)
}
