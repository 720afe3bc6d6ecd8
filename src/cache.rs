//! Process-wide read-through cache for loaded datasets.
//!
//! Each source path (plus load options) owns a slot guarded by its own lock, so
//! concurrent first access to one path loads it exactly once while other paths
//! load independently. An entry is reused until the file's modification time
//! or length changes.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::SystemTime,
};

use anyhow::Result;
use log::debug;

use crate::{
    dataset::{Dataset, LoadOptions, load_dataset},
    error::LoadError,
};

static GLOBAL_CACHE: OnceLock<DatasetCache> = OnceLock::new();

/// Modification signal for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSignature {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceSignature {
    pub fn probe(path: &Path) -> Result<Self, LoadError> {
        let metadata = fs::metadata(path).map_err(|source| LoadError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    options: LoadOptions,
}

#[derive(Debug)]
struct CacheEntry {
    signature: SourceSignature,
    dataset: Arc<Dataset>,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

#[derive(Debug, Default)]
pub struct DatasetCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static DatasetCache {
        GLOBAL_CACHE.get_or_init(DatasetCache::new)
    }

    /// Returns the cached dataset for `path`, loading it on first use or when
    /// the file changed since the last load.
    pub fn get_or_load(&self, path: &Path, options: &LoadOptions) -> Result<Arc<Dataset>> {
        let key = CacheKey {
            path: canonical_source(path),
            options: options.clone(),
        };
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };
        // Entries are immutable snapshots, so a poisoned slot is still consistent.
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let signature = match SourceSignature::probe(path) {
            Ok(signature) => signature,
            Err(err) => {
                *guard = None;
                return Err(err.into());
            }
        };
        if let Some(entry) = guard.as_ref()
            && entry.signature == signature
        {
            debug!("Dataset cache hit for {path:?}");
            return Ok(Arc::clone(&entry.dataset));
        }

        debug!("Dataset cache miss for {path:?}");
        match load_dataset(path, options) {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                *guard = Some(CacheEntry {
                    signature,
                    dataset: Arc::clone(&dataset),
                });
                Ok(dataset)
            }
            Err(err) => {
                *guard = None;
                Err(err)
            }
        }
    }

    /// Drops every entry loaded from `path`, whatever options were used.
    pub fn invalidate(&self, path: &Path) {
        let canonical = canonical_source(path);
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|key, _| key.path != canonical);
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn canonical_source(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
