//! Disk store
//!
//! One record file per id inside a named store directory.
//!
//! ## Layout
//! ```text
//! {data_dir}/{store_name}/
//!   ├── 6b31.rec          (hex of id "k1")
//!   ├── 6b32.rec
//!   ├── sha256-9f86….rec  (id longer than MAX_HEX_ID_LEN bytes)
//!   └── .fc-XXXXXX.tmp    (in-flight write, renamed over its target)
//! ```
//!
//! Writes land in a temp file first and are renamed into place, so a failed
//! put leaves the previous record (or no record) intact.
//!
//! Several stores may share one directory. A temp file is only treated as
//! abandoned once it is older than `STALE_TEMP_AGE`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};

use crate::config::{Config, SyncStrategy};
use crate::error::{CacheError, Result};
use crate::record::CachedFile;

use super::format::{decode_record, encode_record};
use super::RecordStore;

/// File extension of committed records
const RECORD_EXT: &str = "rec";

/// Prefix of in-flight temp files
const TEMP_PREFIX: &str = ".fc-";

/// Suffix of in-flight temp files
const TEMP_SUFFIX: &str = ".tmp";

/// Prefix of record files named by digest instead of hex
const DIGEST_PREFIX: &str = "sha256-";

/// Longest id (in bytes) stored under its hex name; longer ids are hashed
pub const MAX_HEX_ID_LEN: usize = 120;

/// Age after which a temp file is assumed to belong to a dead writer
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// Persistent `RecordStore` backed by a directory
#[derive(Debug)]
pub struct DiskStore {
    /// Directory holding the record files
    dir: PathBuf,

    /// Whether writes are fsynced
    sync_strategy: SyncStrategy,
}

impl DiskStore {
    /// Open or create a store directory
    ///
    /// On startup:
    /// 1. Create the directory if it doesn't exist
    /// 2. Remove temp files left by interrupted writes, skipping any young
    ///    enough to still be in flight in another store instance
    pub fn open(dir: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let mut records = 0usize;
        let mut stray = 0usize;

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            if Self::is_temp_file(&path) {
                if !Self::is_stale(&path) {
                    continue;
                }
                match fs::remove_file(&path) {
                    Ok(()) => stray += 1,
                    Err(e) => tracing::warn!("Could not remove stray file {}: {}", path.display(), e),
                }
            } else if Self::is_record_file(&path) {
                records += 1;
            }
        }

        if stray > 0 {
            tracing::warn!("Removed {} interrupted writes from {}", stray, dir.display());
        }
        tracing::info!("Opened store {} ({} records)", dir.display(), records);

        Ok(Self {
            dir: dir.to_path_buf(),
            sync_strategy,
        })
    }

    /// Open the store named by a config (`data_dir/store_name`)
    pub fn open_with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::open(&config.store_dir(), config.sync_strategy)
    }

    /// The store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `id`
    ///
    /// Short ids map to their hex encoding. Longer ones map to the hex SHA-256
    /// of the id, since their hex form would overrun file name limits. The
    /// `sha256-` prefix is not a hex digit, so the two schemes never meet.
    pub fn record_path(&self, id: &str) -> PathBuf {
        let stem = if id.len() <= MAX_HEX_ID_LEN {
            hex::encode(id)
        } else {
            format!("{}{}", DIGEST_PREFIX, hex::encode(Sha256::digest(id.as_bytes())))
        };
        self.dir.join(format!("{}.{}", stem, RECORD_EXT))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Write `record` atomically to `path`
    fn write_record(&self, path: &Path, record: &CachedFile) -> Result<()> {
        let bytes = encode_record(record)?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)?;
        temp.write_all(&bytes)?;

        if self.sync_strategy == SyncStrategy::EveryWrite {
            temp.as_file().sync_all()?;
        }

        temp.persist(path).map_err(|e| CacheError::Io(e.error))?;

        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.sync_dir()?;
        }

        Ok(())
    }

    /// fsync the directory so renames and unlinks are durable
    #[cfg(unix)]
    fn sync_dir(&self) -> Result<()> {
        fs::File::open(&self.dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<()> {
        Ok(())
    }

    /// Paths of every committed record file
    fn record_files(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && Self::is_record_file(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn read_record_file(path: &Path) -> Result<Option<CachedFile>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(decode_record(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn is_record_file(path: &Path) -> bool {
        path.extension().map_or(false, |ext| ext == RECORD_EXT)
    }

    /// Whether a temp file has outlived any plausible write
    fn is_stale(path: &Path) -> bool {
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            // Renamed or removed by its writer in the meantime
            Err(_) => return false,
        };
        SystemTime::now()
            .duration_since(modified)
            .map_or(false, |age| age >= STALE_TEMP_AGE)
    }

    fn is_temp_file(path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy())
            .map_or(false, |name| name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX))
    }
}

impl RecordStore for DiskStore {
    fn get(&self, id: &str) -> Result<Option<CachedFile>> {
        let path = self.record_path(id);
        match Self::read_record_file(&path)? {
            Some(record) if record.id != id => Err(CacheError::Corruption(format!(
                "{} holds record {}, expected {}",
                path.display(),
                record.id,
                id
            ))),
            other => Ok(other),
        }
    }

    fn put(&self, record: CachedFile) -> Result<()> {
        let path = self.record_path(&record.id);
        self.write_record(&path, &record)
    }

    fn update(&self, id: &str, record: CachedFile) -> Result<()> {
        if record.id != id {
            return Err(CacheError::Storage(format!(
                "record id {} does not match {}",
                record.id, id
            )));
        }

        let path = self.record_path(id);
        if !path.exists() {
            // Deleted by another store on this directory since the caller looked
            tracing::debug!("Record {} vanished before update, writing it anew", id);
        }
        self.write_record(&path, &record)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                if self.sync_strategy == SyncStrategy::EveryWrite {
                    self.sync_dir()?;
                }
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<()> {
        for path in self.record_files()? {
            match fs::remove_file(&path) {
                Ok(()) => {}
                // Deleted concurrently
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.sync_dir()?;
        }
        Ok(())
    }

    fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.record_path(id).is_file())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.record_files()?.len())
    }

    fn ids_by_cached_at(&self) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        for path in self.record_files()? {
            if let Some(record) = Self::read_record_file(&path)? {
                entries.push((record.cached_at, record.id));
            }
        }
        entries.sort();
        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }
}
