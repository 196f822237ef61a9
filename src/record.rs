//! Record definitions
//!
//! The persisted unit (`CachedFile`) and the views handed back to callers.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A logical file as supplied by and returned to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// File name
    pub name: String,

    /// MIME type (may be empty)
    pub mime_type: String,

    /// Last modified timestamp (unix millis), passed through untouched
    pub last_modified: i64,

    /// The original, uncompressed bytes
    pub bytes: Vec<u8>,
}

impl FileContent {
    /// Create file content with an empty MIME type and `last_modified` set to now
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: String::new(),
            last_modified: now_millis() as i64,
            bytes: bytes.into(),
        }
    }

    /// Set the MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set the last modified timestamp (unix millis)
    pub fn with_last_modified(mut self, last_modified: i64) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Length of the payload in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Caller-visible size metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// Size of the uncompressed payload
    pub size: u64,

    /// Size of the stored payload, `None` if it was stored uncompressed
    pub compressed_size: Option<u64>,
}

/// Result of a cache hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub file: FileContent,
    pub metadata: FileMetadata,
}

/// Payload bytes as they sit in the store
///
/// The variant is the only record of whether the bytes must be decompressed
/// on the way out; it is fixed at write time and never guessed from content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredPayload {
    /// Original bytes, stored as given
    Raw(Vec<u8>),

    /// Codec output plus the length of the bytes it came from
    Compressed { bytes: Vec<u8>, original_size: u64 },
}

impl StoredPayload {
    /// Length of the original payload
    pub fn size(&self) -> u64 {
        match self {
            StoredPayload::Raw(bytes) => bytes.len() as u64,
            StoredPayload::Compressed { original_size, .. } => *original_size,
        }
    }

    /// Length of the stored bytes if they are compressed
    pub fn compressed_size(&self) -> Option<u64> {
        match self {
            StoredPayload::Raw(_) => None,
            StoredPayload::Compressed { bytes, .. } => Some(bytes.len() as u64),
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, StoredPayload::Compressed { .. })
    }

    /// The bytes as stored
    pub fn stored_bytes(&self) -> &[u8] {
        match self {
            StoredPayload::Raw(bytes) => bytes,
            StoredPayload::Compressed { bytes, .. } => bytes,
        }
    }
}

/// A single cached file as persisted by a `RecordStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFile {
    /// Unique cache key
    pub id: String,

    /// Stored bytes and compression state
    pub payload: StoredPayload,

    /// File name
    pub name: String,

    /// MIME type
    pub mime_type: String,

    /// Last modified timestamp of the original file (unix millis)
    pub last_modified: i64,

    /// When this record was written (unix millis)
    pub cached_at: u64,
}

impl CachedFile {
    /// Size metadata, read without touching the payload bytes
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: self.payload.size(),
            compressed_size: self.payload.compressed_size(),
        }
    }
}

/// Current time as unix millis
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
