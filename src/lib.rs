//! # filecache
//!
//! A local, persistent cache for files keyed by an opaque id, with:
//! - Transparent gzip compression (on by default, opt-out per put)
//! - Size metadata recorded at write time (`size`, `compressed_size`)
//! - Byte-exact reads whether or not a payload was compressed
//! - Atomic, checksummed record files
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Caller                               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ put / get / delete / clear
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      FileCache                               │
//! │          (compression decision, size metadata)               │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐            ┌─────────────────┐
//!   │      Codec      │            │   RecordStore   │
//!   │     (gzip)      │            │ (Disk / Memory) │
//!   └─────────────────┘            └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use filecache::{Config, FileCache, FileContent};
//!
//! let cache = FileCache::open(Config::builder().data_dir("/tmp/cache").build())?;
//! cache.put("k1", &FileContent::new("test.txt", "Hello, World!"))?;
//!
//! let entry = cache.get("k1")?.expect("cached");
//! assert_eq!(entry.file.bytes, b"Hello, World!");
//! assert_eq!(entry.metadata.size, 13);
//! # Ok::<(), filecache::CacheError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod codec;
pub mod store;
pub mod cache;
pub mod size;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CacheError, Result};
pub use config::{Config, SyncStrategy};
pub use record::{CacheEntry, CachedFile, FileContent, FileMetadata, StoredPayload};
pub use codec::{Codec, GzipCodec};
pub use store::{DiskStore, MemoryStore, RecordStore};
pub use cache::FileCache;
pub use size::format_file_size;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of filecache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
