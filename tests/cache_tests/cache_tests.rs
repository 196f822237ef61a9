//! Tests for FileCache
//!
//! These tests verify:
//! - Basic put/get/delete/clear
//! - Compression flag fidelity in metadata
//! - Full replacement on overwrite (including flipping compression)
//! - Miss semantics
//! - Persistence across reopen
//! - Error propagation (codec failures, empty ids)
//! - Concurrent access through a shared cache

use std::sync::Arc;
use std::thread;

use filecache::codec::{Codec, GzipCodec};
use filecache::config::{Config, SyncStrategy};
use filecache::record::{CachedFile, FileContent, StoredPayload};
use filecache::store::{MemoryStore, RecordStore};
use filecache::{CacheError, FileCache};
use proptest::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .store_name("test-db")
        .sync_strategy(SyncStrategy::EveryWrite)
        .build()
}

fn setup_temp_cache() -> (TempDir, FileCache) {
    let temp_dir = TempDir::new().unwrap();
    let cache = FileCache::open(config_for(&temp_dir)).unwrap();
    (temp_dir, cache)
}

fn memory_cache() -> FileCache<MemoryStore, GzipCodec> {
    FileCache::new(MemoryStore::new(), GzipCodec::default(), &Config::default())
}

fn hello_file() -> FileContent {
    FileContent::new("test.txt", "Hello, World!")
        .with_mime_type("text/plain")
        .with_last_modified(1_700_000_000_123)
}

/// Store whose existence check always says yes, as if another writer
/// deleted the record between the check and the write
struct VanishingStore(MemoryStore);

impl RecordStore for VanishingStore {
    fn get(&self, id: &str) -> filecache::Result<Option<CachedFile>> {
        self.0.get(id)
    }

    fn put(&self, record: CachedFile) -> filecache::Result<()> {
        self.0.put(record)
    }

    fn update(&self, id: &str, record: CachedFile) -> filecache::Result<()> {
        self.0.update(id, record)
    }

    fn delete(&self, id: &str) -> filecache::Result<bool> {
        self.0.delete(id)
    }

    fn clear(&self) -> filecache::Result<()> {
        self.0.clear()
    }

    fn contains(&self, _id: &str) -> filecache::Result<bool> {
        Ok(true)
    }

    fn len(&self) -> filecache::Result<usize> {
        self.0.len()
    }

    fn ids_by_cached_at(&self) -> filecache::Result<Vec<String>> {
        self.0.ids_by_cached_at()
    }
}

/// Codec that always fails, for error propagation tests
struct BrokenCodec;

impl Codec for BrokenCodec {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn compress(&self, _input: &[u8]) -> filecache::Result<Vec<u8>> {
        Err(CacheError::Codec("compressor unavailable".to_string()))
    }

    fn decompress(&self, _input: &[u8]) -> filecache::Result<Vec<u8>> {
        Err(CacheError::Codec("decompressor unavailable".to_string()))
    }
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_put_get() {
    let (_temp, cache) = setup_temp_cache();
    let original = hello_file();

    cache.put("id1", &original).unwrap();
    let entry = cache.get("id1").unwrap().expect("cached");

    assert_eq!(entry.file.name, "test.txt");
    assert_eq!(entry.file.mime_type, "text/plain");
    assert_eq!(entry.file.last_modified, 1_700_000_000_123);
    assert_eq!(entry.file.bytes, b"Hello, World!");
    assert_eq!(entry.metadata.size, original.size());
    assert_eq!(entry.file, original);
}

#[test]
fn test_put_compresses_by_default() {
    let (_temp, cache) = setup_temp_cache();

    cache.put("k1", &hello_file()).unwrap();
    let entry = cache.get("k1").unwrap().unwrap();

    assert_eq!(entry.metadata.size, 13);
    let compressed = entry.metadata.compressed_size.expect("compressed");
    // gzip framing is 18 bytes on top of the deflate output
    assert!(compressed <= 13 + 64);
    assert!(cache.store().get("k1").unwrap().unwrap().payload.is_compressed());
}

#[test]
fn test_put_uncompressed() {
    let (_temp, cache) = setup_temp_cache();

    cache.put_with("k2", &hello_file(), false).unwrap();
    let entry = cache.get("k2").unwrap().unwrap();

    assert_eq!(entry.metadata.compressed_size, None);
    assert_eq!(entry.metadata.size, 13);
    assert_eq!(entry.file.bytes, b"Hello, World!");
}

#[test]
fn test_compress_by_default_disabled_in_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .compress_by_default(false)
        .build();
    let cache = FileCache::open(config).unwrap();

    cache.put("k", &hello_file()).unwrap();

    assert_eq!(cache.metadata("k").unwrap().unwrap().compressed_size, None);
}

#[test]
fn test_compressible_content_stored_smaller() {
    let (_temp, cache) = setup_temp_cache();
    let file = FileContent::new("big.txt", vec![b'A'; 10_000]);

    cache.put("big", &file).unwrap();
    let metadata = cache.metadata("big").unwrap().unwrap();

    assert_eq!(metadata.size, 10_000);
    assert!(metadata.compressed_size.unwrap() < metadata.size);
}

#[test]
fn test_empty_payload() {
    let (_temp, cache) = setup_temp_cache();
    let file = FileContent::new("empty.bin", Vec::new());

    cache.put("compressed", &file).unwrap();
    cache.put_with("raw", &file, false).unwrap();

    let compressed = cache.get("compressed").unwrap().unwrap();
    assert!(compressed.file.bytes.is_empty());
    assert_eq!(compressed.metadata.size, 0);
    assert!(compressed.metadata.compressed_size.is_some());

    let raw = cache.get("raw").unwrap().unwrap();
    assert!(raw.file.bytes.is_empty());
    assert_eq!(raw.metadata.compressed_size, None);
}

#[test]
fn test_binary_payload() {
    let (_temp, cache) = setup_temp_cache();
    let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let file = FileContent::new("blob.bin", bytes.clone()).with_mime_type("application/octet-stream");

    cache.put("blob", &file).unwrap();

    assert_eq!(cache.get("blob").unwrap().unwrap().file.bytes, bytes);
}

// =============================================================================
// Overwrite Tests
// =============================================================================

#[test]
fn test_overwrite_replaces_whole_record() {
    let (_temp, cache) = setup_temp_cache();
    let a = FileContent::new("a.txt", "first version, rather long")
        .with_mime_type("text/plain")
        .with_last_modified(1);
    let b = FileContent::new("b.md", "second").with_last_modified(2);

    cache.put("id", &a).unwrap();
    cache.put("id", &b).unwrap();
    let entry = cache.get("id").unwrap().unwrap();

    assert_eq!(entry.file, b);
    assert_eq!(entry.file.mime_type, "");
    assert_eq!(entry.metadata.size, 6);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn test_overwrite_flips_compression_mode() {
    let (_temp, cache) = setup_temp_cache();

    cache.put_with("id", &hello_file(), true).unwrap();
    assert!(cache.metadata("id").unwrap().unwrap().compressed_size.is_some());

    cache.put_with("id", &hello_file(), false).unwrap();
    assert_eq!(cache.metadata("id").unwrap().unwrap().compressed_size, None);
    assert_eq!(cache.get("id").unwrap().unwrap().file, hello_file());

    cache.put_with("id", &hello_file(), true).unwrap();
    assert!(cache.metadata("id").unwrap().unwrap().compressed_size.is_some());
    assert_eq!(cache.get("id").unwrap().unwrap().file, hello_file());
}

#[test]
fn test_overwrite_refreshes_cached_at() {
    let cache = memory_cache();

    cache.put("id", &hello_file()).unwrap();
    let first = cache.store().get("id").unwrap().unwrap().cached_at;

    thread::sleep(std::time::Duration::from_millis(5));
    cache.put("id", &hello_file()).unwrap();
    let second = cache.store().get("id").unwrap().unwrap().cached_at;

    assert!(second > first);
}

// =============================================================================
// Miss / Delete / Clear Tests
// =============================================================================

#[test]
fn test_get_missing_is_none() {
    let (_temp, cache) = setup_temp_cache();

    assert!(cache.get("never-cached").unwrap().is_none());
    assert!(cache.metadata("never-cached").unwrap().is_none());
}

#[test]
fn test_put_delete_get() {
    let (_temp, cache) = setup_temp_cache();

    cache.put("k3", &hello_file()).unwrap();
    cache.delete("k3").unwrap();

    assert!(cache.get("k3").unwrap().is_none());
    assert!(!cache.contains("k3").unwrap());
}

#[test]
fn test_delete_missing_is_noop() {
    let (_temp, cache) = setup_temp_cache();
    cache.put("keep", &hello_file()).unwrap();

    cache.delete("nonexistent").unwrap();

    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn test_clear_removes_everything() {
    let (_temp, cache) = setup_temp_cache();
    let ids = ["a", "b", "c"];
    for id in ids {
        cache.put(id, &hello_file()).unwrap();
    }
    cache.put_with("d", &hello_file(), false).unwrap();

    cache.clear().unwrap();

    for id in ids.iter().chain(["d"].iter()) {
        assert!(cache.get(id).unwrap().is_none());
    }
    assert!(cache.is_empty().unwrap());
}

#[test]
fn test_clear_empty_cache() {
    let cache = memory_cache();

    cache.clear().unwrap();

    assert!(cache.is_empty().unwrap());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_records_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let cache = FileCache::open(config_for(&temp_dir)).unwrap();
        cache.put("zipped", &hello_file()).unwrap();
        cache.put_with("plain", &hello_file(), false).unwrap();
    }

    let cache = FileCache::open(config_for(&temp_dir)).unwrap();

    let zipped = cache.get("zipped").unwrap().unwrap();
    assert_eq!(zipped.file, hello_file());
    assert!(zipped.metadata.compressed_size.is_some());

    let plain = cache.get("plain").unwrap().unwrap();
    assert_eq!(plain.file, hello_file());
    assert_eq!(plain.metadata.compressed_size, None);
}

#[test]
fn test_long_url_id_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let id = format!("https://cdn.example.com/assets/{}/thumbnail.png?w=640&h=480", "a1b2c3d4".repeat(20));
    assert!(id.len() > 140);

    {
        let cache = FileCache::open(config_for(&temp_dir)).unwrap();
        assert!(cache.get(&id).unwrap().is_none());
        cache.put(&id, &hello_file()).unwrap();
    }

    let cache = FileCache::open(config_for(&temp_dir)).unwrap();
    assert_eq!(cache.get(&id).unwrap().unwrap().file, hello_file());
    assert_eq!(cache.ids().unwrap(), vec![id.clone()]);

    cache.delete(&id).unwrap();
    assert!(cache.get(&id).unwrap().is_none());
}

#[test]
fn test_ids_oldest_first() {
    let cache = memory_cache();

    cache.put("first", &hello_file()).unwrap();
    thread::sleep(std::time::Duration::from_millis(5));
    cache.put("second", &hello_file()).unwrap();
    thread::sleep(std::time::Duration::from_millis(5));
    cache.put("first", &hello_file()).unwrap();

    assert_eq!(cache.ids().unwrap(), vec!["second", "first"]);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_empty_id_rejected() {
    let (_temp, cache) = setup_temp_cache();

    let err = cache.put("", &hello_file()).unwrap_err();

    assert!(matches!(err, CacheError::InvalidKey(_)));
}

#[test]
fn test_invalid_compression_level_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .compression_level(12)
        .build();

    assert!(matches!(FileCache::open(config), Err(CacheError::Config(_))));
}

#[test]
fn test_corrupted_compressed_payload_is_error_not_miss() {
    let cache = memory_cache();
    cache
        .store()
        .put(CachedFile {
            id: "bad".to_string(),
            payload: StoredPayload::Compressed {
                bytes: b"definitely not gzip data at all".to_vec(),
                original_size: 31,
            },
            name: "bad.txt".to_string(),
            mime_type: String::new(),
            last_modified: 0,
            cached_at: 0,
        })
        .unwrap();

    let err = cache.get("bad").unwrap_err();

    assert!(err.is_codec());
    // Size metadata is still readable without decompressing
    assert_eq!(cache.metadata("bad").unwrap().unwrap().size, 31);
}

#[test]
fn test_raw_payload_never_decompressed() {
    let cache = FileCache::new(MemoryStore::new(), BrokenCodec, &Config::default());
    let gzip_bytes = GzipCodec::default().compress(b"looks compressed").unwrap();
    let file = FileContent::new("x.gz", gzip_bytes.clone());

    cache.put_with("raw", &file, false).unwrap();

    // Bytes that happen to be gzip come back exactly as stored
    assert_eq!(cache.get("raw").unwrap().unwrap().file.bytes, gzip_bytes);
}

#[test]
fn test_failed_put_leaves_previous_record() {
    let store = MemoryStore::new();
    let cache = FileCache::new(store, BrokenCodec, &Config::default());
    cache.put_with("id", &hello_file(), false).unwrap();

    let err = cache
        .put_with("id", &FileContent::new("new.txt", "replacement"), true)
        .unwrap_err();

    assert!(err.is_codec());
    assert_eq!(cache.get("id").unwrap().unwrap().file, hello_file());
}

#[test]
fn test_failed_put_inserts_nothing() {
    let cache = FileCache::new(MemoryStore::new(), BrokenCodec, &Config::default());

    assert!(cache.put("id", &hello_file()).is_err());

    assert!(cache.get("id").unwrap().is_none());
}

#[test]
fn test_corrupted_record_file_is_storage_error() {
    let (_temp, cache) = setup_temp_cache();
    cache.put("k", &hello_file()).unwrap();

    let path = cache.store().record_path("k");
    std::fs::write(&path, b"garbage").unwrap();

    let err = cache.get("k").unwrap_err();
    assert!(err.is_storage());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_puts_on_different_ids() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Arc::new(FileCache::open(config_for(&temp_dir)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..10 {
                    let id = format!("t{}-{}", t, i);
                    let file = FileContent::new(format!("{}.txt", id), id.repeat(20));
                    cache.put_with(&id, &file, i % 2 == 0).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len().unwrap(), 80);
    for t in 0..8 {
        for i in 0..10 {
            let id = format!("t{}-{}", t, i);
            let entry = cache.get(&id).unwrap().unwrap();
            assert_eq!(entry.file.bytes, id.repeat(20).into_bytes());
        }
    }
}

#[test]
fn test_concurrent_writes_same_id_last_write_wins() {
    let cache = Arc::new(memory_cache());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let file = FileContent::new("same.txt", format!("writer {}", t));
                cache.put("same", &file).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let entry = cache.get("same").unwrap().unwrap();
    let text = String::from_utf8(entry.file.bytes).unwrap();
    assert!(text.starts_with("writer "));
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn test_put_after_concurrent_delete_still_writes() {
    let cache = FileCache::new(
        VanishingStore(MemoryStore::new()),
        GzipCodec::default(),
        &Config::default(),
    );

    cache.put("gone", &hello_file()).unwrap();

    assert_eq!(cache.get("gone").unwrap().unwrap().file, hello_file());
}

#[test]
fn test_update_after_other_cache_deleted() {
    let temp_dir = TempDir::new().unwrap();
    let writer = FileCache::open(config_for(&temp_dir)).unwrap();
    let deleter = FileCache::open(config_for(&temp_dir)).unwrap();

    writer.put("shared", &hello_file()).unwrap();
    let mut record = writer.store().get("shared").unwrap().unwrap();
    deleter.delete("shared").unwrap();

    // writer saw the record, so it goes down the update path
    record.name = "renamed.txt".to_string();
    writer.store().update("shared", record).unwrap();

    let entry = deleter.get("shared").unwrap().unwrap();
    assert_eq!(entry.file.name, "renamed.txt");
    assert_eq!(entry.file.bytes, hello_file().bytes);
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cache_round_trip(
        id in "[a-zA-Z0-9_-]{1,32}",
        name in ".{0,40}",
        mime_type in "[a-z]{0,10}(/[a-z]{1,10})?",
        last_modified in any::<i64>(),
        bytes in proptest::collection::vec(any::<u8>(), 0..2048),
        compress in any::<bool>(),
    ) {
        let cache = memory_cache();
        let file = FileContent {
            name,
            mime_type,
            last_modified,
            bytes,
        };

        cache.put_with(&id, &file, compress).unwrap();
        let entry = cache.get(&id).unwrap().unwrap();

        prop_assert_eq!(entry.metadata.size, file.size());
        prop_assert_eq!(entry.metadata.compressed_size.is_some(), compress);
        prop_assert_eq!(entry.file, file);
    }
}
