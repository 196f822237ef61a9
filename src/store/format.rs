//! Record file encoding
//!
//! Frames a bincode-encoded `CachedFile` with a header and a CRC32 footer.

use crate::error::{CacheError, Result};
use crate::record::CachedFile;

/// Magic bytes identifying a filecache record file
pub(crate) const MAGIC: &[u8; 4] = b"FCRC";

/// Current record format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + BodyLen (4) = 10 bytes
pub const HEADER_SIZE: usize = 10;

/// Footer size: BodyCRC (4)
pub const FOOTER_SIZE: usize = 4;

/// Encode a record into its on-disk framing
pub fn encode_record(record: &CachedFile) -> Result<Vec<u8>> {
    let body = bincode::serialize(record)?;

    let body_len = u32::try_from(body.len()).map_err(|_| {
        CacheError::Storage(format!("record too large: {} bytes", body.len()))
    })?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&body);
    let crc = hasher.finalize();

    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len() + FOOTER_SIZE);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&body_len.to_le_bytes());
    buf.extend_from_slice(&body);
    buf.extend_from_slice(&crc.to_le_bytes());

    Ok(buf)
}

/// Decode a record, validating framing and checksum
pub fn decode_record(bytes: &[u8]) -> Result<CachedFile> {
    if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
        return Err(CacheError::Corruption(format!(
            "record too short: {} bytes",
            bytes.len()
        )));
    }

    if &bytes[0..4] != MAGIC {
        return Err(CacheError::Corruption("bad magic bytes".to_string()));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(CacheError::Corruption(format!(
            "unsupported record version {}",
            version
        )));
    }

    let body_len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let expected_len = HEADER_SIZE + body_len + FOOTER_SIZE;
    if bytes.len() != expected_len {
        return Err(CacheError::Corruption(format!(
            "length mismatch: header says {} bytes, file has {}",
            expected_len,
            bytes.len()
        )));
    }

    let body = &bytes[HEADER_SIZE..HEADER_SIZE + body_len];
    let footer = &bytes[HEADER_SIZE + body_len..];
    let stored_crc = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(body);
    let computed_crc = hasher.finalize();

    if stored_crc != computed_crc {
        return Err(CacheError::Corruption(format!(
            "CRC mismatch: stored {:08x}, computed {:08x}",
            stored_crc, computed_crc
        )));
    }

    Ok(bincode::deserialize(body)?)
}
