//! Store Module
//!
//! Persistent key-value tables the cache is built on.
//!
//! ## Responsibilities
//! - Keep one `CachedFile` per id, nothing more
//! - get / put / update / delete / clear by id
//! - List ids by `cached_at` (secondary ordering, unused by the cache itself)
//!
//! ## Record File Format (`DiskStore`)
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (10 bytes)                                       │
//! │   Magic: "FCRC" (4) | Version: u16 (2) | BodyLen: u32 (4)│
//! ├─────────────────────────────────────────────────────────┤
//! │ Body (BodyLen bytes)                                    │
//! │   bincode(CachedFile)                                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   CRC32(Body): u32                                      │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod disk;
mod format;
mod memory;

pub use disk::{DiskStore, MAX_HEX_ID_LEN, STALE_TEMP_AGE};
pub use format::{decode_record, encode_record, FOOTER_SIZE, HEADER_SIZE};
pub use memory::MemoryStore;

use crate::error::Result;
use crate::record::CachedFile;

/// A durable table of cached files keyed by id
///
/// Implementations do their own locking; every method takes `&self`.
/// There are no transactions spanning more than one id.
pub trait RecordStore: Send + Sync {
    /// Look up a record
    fn get(&self, id: &str) -> Result<Option<CachedFile>>;

    /// Insert a record, replacing any record with the same id
    fn put(&self, record: CachedFile) -> Result<()>;

    /// Replace the record for `id`
    ///
    /// If the record is gone (another writer deleted it after the caller
    /// checked), it is written anyway: the last write wins. Fails with a
    /// storage error if `record.id` is not `id`.
    fn update(&self, id: &str, record: CachedFile) -> Result<()>;

    /// Remove a record, returning whether it existed
    fn delete(&self, id: &str) -> Result<bool>;

    /// Remove every record
    fn clear(&self) -> Result<()>;

    /// Whether a record exists for `id`
    fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Number of records
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All ids, oldest `cached_at` first (ties broken by id)
    fn ids_by_cached_at(&self) -> Result<Vec<String>>;
}
