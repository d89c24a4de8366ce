#![allow(dead_code)]

//! Per-source corpus cache.
//!
//! Each source location owns a `OnceLock` cell handed out under a short
//! mutex, so two requests racing to vectorize the same uncached source never
//! duplicate the CPU-bound work: the first caller runs the load inside
//! `get_or_init`, the second blocks on the cell and reuses the result.
//! Successful loads persist for the process lifetime; failed loads are
//! evicted afterwards so a later request may retry against changed data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::models::posting::PostingRecord;

/// A loaded, vectorized posting source. Immutable once cached.
#[derive(Debug)]
pub struct LoadedCorpus {
    pub postings: Vec<PostingRecord>,
    /// One 69-component TF-IDF vector per posting, index-aligned.
    pub vectors: Vec<Vec<f64>>,
}

type Cell = Arc<OnceLock<Option<Arc<LoadedCorpus>>>>;

#[derive(Debug, Default)]
pub struct CorpusCache {
    cells: Mutex<HashMap<PathBuf, Cell>>,
}

impl CorpusCache {
    /// Returns the cached corpus for `key`, or runs `load` exactly once per
    /// cache generation to produce it. `None` from `load` means the source
    /// is unusable for this request.
    pub fn get_or_load<F>(&self, key: &Path, load: F) -> Option<Arc<LoadedCorpus>>
    where
        F: FnOnce() -> Option<LoadedCorpus>,
    {
        let cell = self.cell(key);
        let loaded = cell.get_or_init(|| load().map(Arc::new)).clone();
        if loaded.is_none() {
            self.evict(key, &cell);
        }
        loaded
    }

    /// Drops every cached corpus; the next access reloads from source.
    pub fn clear(&self) {
        self.lock_cells().clear();
    }

    /// Number of source locations currently cached.
    pub fn len(&self) -> usize {
        self.lock_cells().len()
    }

    fn cell(&self, key: &Path) -> Cell {
        Arc::clone(
            self.lock_cells()
                .entry(key.to_path_buf())
                .or_default(),
        )
    }

    /// Removes a failed cell, but only if it is still the one we initialized;
    /// a concurrent `clear` may already have replaced it.
    fn evict(&self, key: &Path, cell: &Cell) {
        let mut cells = self.lock_cells();
        if let Some(current) = cells.get(key) {
            if Arc::ptr_eq(current, cell) {
                cells.remove(key);
            }
        }
    }

    fn lock_cells(&self) -> MutexGuard<'_, HashMap<PathBuf, Cell>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
