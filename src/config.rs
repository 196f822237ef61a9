//! Configuration for filecache
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Gzip level used when none is configured
///
/// Level 3 is noticeably faster than the default level 6 while producing
/// output that is only slightly larger.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 3;

/// Highest level accepted by the gzip codec
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Main configuration for a filecache instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all named stores
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {store_name}/
    ///           ├── <hex id>.rec
    ///           └── ...
    pub data_dir: PathBuf,

    /// Name of the store inside `data_dir`
    pub store_name: String,

    /// How record files are flushed to disk
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Compression Configuration
    // -------------------------------------------------------------------------
    /// Gzip level (0-9)
    pub compression_level: u32,

    /// Whether `FileCache::put` compresses when the caller does not say
    pub compress_by_default: bool,
}

/// Record file sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync every record file and its directory (safest, slowest)
    EveryWrite,

    /// Leave flushing to the operating system
    OsManaged,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./filecache_data"),
            store_name: "file-cache".to_string(),
            sync_strategy: SyncStrategy::EveryWrite,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            compress_by_default: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Directory holding this config's store
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join(&self.store_name)
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(CacheError::Config(format!(
                "compression level {} out of range (0-{})",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }

        if self.store_name.is_empty()
            || self.store_name.contains(['/', '\\'])
            || self.store_name == "."
            || self.store_name == ".."
        {
            return Err(CacheError::Config(format!(
                "invalid store name: {:?}",
                self.store_name
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all stores)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the store name
    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.config.store_name = name.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the gzip level
    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level;
        self
    }

    /// Set whether puts compress unless told otherwise
    pub fn compress_by_default(mut self, compress: bool) -> Self {
        self.config.compress_by_default = compress;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
