//! Gzip codec
//!
//! Single-member gzip streams via flate2.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::config::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL};
use crate::error::{CacheError, Result};
use crate::size::format_file_size_default;

use super::Codec;

/// Smallest possible gzip member: header (10) + empty deflate block (2) + trailer (8)
const MIN_GZIP_LEN: usize = 20;

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Gzip compressor with a fixed level
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl GzipCodec {
    /// Create a codec with the given level (0-9)
    pub fn new(level: u32) -> Result<Self> {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(CacheError::Config(format!(
                "gzip level {} out of range (0-{})",
                level, MAX_COMPRESSION_LEVEL
            )));
        }
        Ok(Self {
            level: Compression::new(level),
        })
    }

    /// The configured level
    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self {
            level: Compression::new(DEFAULT_COMPRESSION_LEVEL),
        }
    }
}

impl Codec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(input.len() / 2 + MIN_GZIP_LEN), self.level);
        encoder
            .write_all(input)
            .map_err(|e| CacheError::Codec(format!("gzip compress failed: {}", e)))?;
        let compressed = encoder
            .finish()
            .map_err(|e| CacheError::Codec(format!("gzip compress failed: {}", e)))?;

        tracing::debug!(
            "Gzipped {} to {}",
            format_file_size_default(input.len() as u64),
            format_file_size_default(compressed.len() as u64)
        );

        Ok(compressed)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        // flate2 reads an empty stream as empty output; that is not a stream we wrote
        if input.len() < MIN_GZIP_LEN || input[..2] != GZIP_MAGIC {
            return Err(CacheError::Codec(format!(
                "not a gzip stream ({} bytes)",
                input.len()
            )));
        }

        let mut decoder = GzDecoder::new(input);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| CacheError::Codec(format!("gzip decompress failed: {}", e)))?;

        tracing::debug!(
            "Gunzipped {} to {}",
            format_file_size_default(input.len() as u64),
            format_file_size_default(decompressed.len() as u64)
        );

        Ok(decompressed)
    }
}
