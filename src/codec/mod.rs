//! Codec Module
//!
//! Reversible byte transforms applied to payloads before they are stored.
//!
//! ## Contract
//! - `compress` accepts any byte sequence, including the empty one
//! - `decompress` rejects input that this codec did not produce
//! - `decompress(compress(x)) == x` for every `x`
//!
//! Output only needs to be decompressible, not byte-identical between calls.
//! Codecs hold no state between calls, so one instance is shared by every
//! operation of a cache.

mod gzip;

pub use gzip::GzipCodec;

use crate::error::Result;

/// A lossless byte-stream compressor
pub trait Codec: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Compress `input` into a new buffer
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Recover the bytes `compress` was given
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;
}
