//! Cache Module
//!
//! The file cache that sits between callers and a `RecordStore`.
//!
//! ## Responsibilities
//! - Decide per put whether the payload is compressed
//! - Record the original and stored sizes at write time
//! - Hand back the original bytes on get, whatever the storage mode
//! - Treat misses as normal outcomes, never as errors

use parking_lot::Mutex;

use crate::codec::{Codec, GzipCodec};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::record::{now_millis, CacheEntry, CachedFile, FileContent, FileMetadata, StoredPayload};
use crate::size::format_file_size_default;
use crate::store::{DiskStore, RecordStore};

/// A persistent cache of files keyed by id
///
/// ## Concurrency
/// - All methods take `&self`; share the cache behind an `Arc`
/// - Writes through one cache (put/delete/clear) are serialized by
///   `write_lock`, so a put's existence check and write are not split by
///   another write through the same cache
/// - Reads never take `write_lock`
/// - Two caches over the same store directory: last write wins
pub struct FileCache<S: RecordStore = DiskStore, C: Codec = GzipCodec> {
    /// Backing table
    store: S,

    /// Payload compressor
    codec: C,

    /// Whether `put` compresses
    compress_by_default: bool,

    /// Serializes write operations
    write_lock: Mutex<()>,
}

impl FileCache<DiskStore, GzipCodec> {
    /// Open the disk-backed store named by `config` with a gzip codec
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::debug!("Creating file cache in {}", config.store_dir().display());
        let store = DiskStore::open_with_config(&config)?;
        let codec = GzipCodec::new(config.compression_level)?;
        tracing::debug!("File cache created");

        Ok(Self::new(store, codec, &config))
    }
}

impl<S: RecordStore, C: Codec> FileCache<S, C> {
    /// Build a cache over an existing store and codec
    pub fn new(store: S, codec: C, config: &Config) -> Self {
        Self {
            store,
            codec,
            compress_by_default: config.compress_by_default,
            write_lock: Mutex::new(()),
        }
    }

    /// Cache a file under `id`, compressing it unless the config says otherwise
    pub fn put(&self, id: &str, file: &FileContent) -> Result<()> {
        self.put_with(id, file, self.compress_by_default)
    }

    /// Cache a file under `id`, replacing any existing record in full
    ///
    /// Steps:
    /// 1. Compress the payload if asked (before any store access)
    /// 2. Acquire write lock
    /// 3. Update the existing record or insert a new one
    pub fn put_with(&self, id: &str, file: &FileContent, compress: bool) -> Result<()> {
        Self::check_id(id)?;

        let payload = if compress {
            let bytes = self.codec.compress(&file.bytes)?;
            tracing::debug!(
                "Compressed {} ({}) from {} to {} with {}",
                file.name,
                id,
                format_file_size_default(file.size()),
                format_file_size_default(bytes.len() as u64),
                self.codec.name()
            );
            StoredPayload::Compressed {
                bytes,
                original_size: file.size(),
            }
        } else {
            StoredPayload::Raw(file.bytes.clone())
        };

        let record = CachedFile {
            id: id.to_string(),
            payload,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            last_modified: file.last_modified,
            cached_at: now_millis(),
        };

        let _write_guard = self.write_lock.lock();

        if self.store.contains(id)? {
            self.store.update(id, record)?;
            tracing::debug!("Updated existing file {} ({})", file.name, id);
        } else {
            self.store.put(record)?;
            tracing::debug!("Put new file {} ({})", file.name, id);
        }

        Ok(())
    }

    /// Get a cached file by id
    ///
    /// Returns:
    /// - `Ok(Some(entry))`: hit, with the original bytes
    /// - `Ok(None)`: nothing cached under `id`
    /// - `Err(Codec)`: the record is flagged compressed but does not decompress
    pub fn get(&self, id: &str) -> Result<Option<CacheEntry>> {
        let Some(record) = self.store.get(id)? else {
            tracing::debug!("Cache miss getting file ({})", id);
            return Ok(None);
        };

        tracing::debug!("Get file {} ({})", record.name, id);

        let metadata = record.metadata();
        let bytes = match record.payload {
            StoredPayload::Raw(bytes) => bytes,
            StoredPayload::Compressed { bytes, original_size } => {
                let bytes = self.codec.decompress(&bytes)?;
                if bytes.len() as u64 != original_size {
                    return Err(CacheError::Codec(format!(
                        "{} decompressed to {} bytes, expected {}",
                        id,
                        bytes.len(),
                        original_size
                    )));
                }
                tracing::debug!("Decompressed file ({})", id);
                bytes
            }
        };

        let file = FileContent {
            name: record.name,
            mime_type: record.mime_type,
            last_modified: record.last_modified,
            bytes,
        };

        Ok(Some(CacheEntry { file, metadata }))
    }

    /// Size metadata for `id` without reading back the payload
    pub fn metadata(&self, id: &str) -> Result<Option<FileMetadata>> {
        Ok(self.store.get(id)?.map(|record| record.metadata()))
    }

    /// Delete the cached file with a given id, if it exists
    pub fn delete(&self, id: &str) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        if self.store.delete(id)? {
            tracing::debug!("Deleted file ({})", id);
        } else {
            tracing::debug!("Cache miss deleting file ({})", id);
        }

        Ok(())
    }

    /// Clear all cached files
    pub fn clear(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        self.store.clear()?;
        tracing::debug!("Cleared all files");

        Ok(())
    }

    /// Whether a file is cached under `id`
    pub fn contains(&self, id: &str) -> Result<bool> {
        self.store.contains(id)
    }

    /// Number of cached files
    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }

    /// Cached ids, least recently written first
    pub fn ids(&self) -> Result<Vec<String>> {
        self.store.ids_by_cached_at()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The payload codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn check_id(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(CacheError::InvalidKey("id must not be empty".to_string()));
        }
        Ok(())
    }
}
