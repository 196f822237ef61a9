//! In-memory store
//!
//! BTreeMap guarded by a RwLock. Nothing survives the process; used for tests
//! and throwaway caches.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::{CacheError, Result};
use crate::record::CachedFile;

use super::RecordStore;

/// Volatile `RecordStore`
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, CachedFile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<CachedFile>> {
        Ok(self.records.read().get(id).cloned())
    }

    fn put(&self, record: CachedFile) -> Result<()> {
        self.records.write().insert(record.id.clone(), record);
        Ok(())
    }

    fn update(&self, id: &str, record: CachedFile) -> Result<()> {
        if record.id != id {
            return Err(CacheError::Storage(format!(
                "record id {} does not match {}",
                record.id, id
            )));
        }

        self.records.write().insert(id.to_string(), record);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records.write().remove(id).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.records.write().clear();
        Ok(())
    }

    fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.records.read().contains_key(id))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    fn ids_by_cached_at(&self) -> Result<Vec<String>> {
        let records = self.records.read();
        let mut entries: Vec<(u64, &String)> =
            records.values().map(|r| (r.cached_at, &r.id)).collect();
        entries.sort();
        Ok(entries.into_iter().map(|(_, id)| id.clone()).collect())
    }
}
