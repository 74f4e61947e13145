//! # Palette Cache
//!
//! Palette directories shared by several jobs are parsed once. The map is read-mostly: lookups
//! take the read lock, and the write lock is only held to publish a freshly loaded store.

use std::{
    collections::HashMap,
    hash::BuildHasherDefault,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use twox_hash::XxHash64;

use crate::error::Result;

use super::PaletteStore;

type StoreMap = HashMap<PathBuf, Arc<PaletteStore>, BuildHasherDefault<XxHash64>>;

#[derive(Debug, Default)]
pub struct PaletteCache {
    stores: RwLock<StoreMap>,
}

impl PaletteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dir: &Path) -> Option<Arc<PaletteStore>> {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dir)
            .cloned()
    }

    /// Return the cached store for `dir`, running `load` on a miss. Loading happens outside the
    /// lock; if two jobs race, the first store published wins and both get it.
    pub fn get_or_load<F>(&self, dir: &Path, load: F) -> Result<Arc<PaletteStore>>
    where
        F: FnOnce(&Path) -> Result<PaletteStore>,
    {
        if let Some(store) = self.get(dir) {
            return Ok(store);
        }

        let loaded = Arc::new(load(dir)?);
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        Ok(stores
            .entry(dir.to_path_buf())
            .or_insert(loaded)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
