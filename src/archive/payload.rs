use crate::archive::entry::EntryHeader;
use crate::archive::format::{read_bytes, Compression};
use crate::error::{or_truncated, PharError, Result};
use flate2::read::DeflateDecoder;
use std::io::Read;
use tracing::trace;

/// Largest buffer reserved ahead of inflating an entry
const INFLATE_RESERVE: u32 = 64 * 1024;

/// Read, decompress and CRC-check the payload of one entry.
///
/// The reader must be positioned at the first byte of the payload. On
/// success it is left at the first byte of the next payload.
pub fn extract_payload<R: Read>(mut reader: R, header: &EntryHeader) -> Result<Vec<u8>> {
    let compression = header
        .compression()
        .ok_or_else(|| PharError::UnsupportedCompression {
            entry: header.name.clone(),
            flags: header.flags,
        })?;

    let data = match compression {
        Compression::None => read_stored(&mut reader, header, header.size_uncompressed)?,
        Compression::Deflate => {
            let stored = read_stored(&mut reader, header, header.size_compressed)?;
            inflate(&stored, header)?
        }
        Compression::Bzip2 => {
            return Err(PharError::UnsupportedCompression {
                entry: header.name.clone(),
                flags: header.flags,
            })
        }
    };

    let actual = crc32fast::hash(&data);
    if actual != header.crc32 {
        return Err(PharError::ChecksumFailed {
            entry: header.name.clone(),
            expected: header.crc32,
            actual,
        });
    }

    trace!(name = %header.name, size = data.len(), "extracted entry payload");
    Ok(data)
}

fn read_stored<R: Read>(reader: R, header: &EntryHeader, size: u32) -> Result<Vec<u8>> {
    read_bytes(reader, u64::from(size)).map_err(|e| {
        or_truncated(e, || PharError::TruncatedEntryData {
            entry: header.name.clone(),
            expected: size,
        })
    })
}

/// Inflate a raw DEFLATE stream, producing at most one byte more than
/// declared so an oversized stream is caught without inflating all of it.
fn inflate(stored: &[u8], header: &EntryHeader) -> Result<Vec<u8>> {
    let expected = header.size_uncompressed;
    let mut data = Vec::with_capacity(expected.min(INFLATE_RESERVE) as usize);

    DeflateDecoder::new(stored)
        .take(u64::from(expected) + 1)
        .read_to_end(&mut data)
        .map_err(|e| PharError::DecompressionFailed {
            entry: header.name.clone(),
            reason: e.to_string(),
        })?;

    if data.len() as u64 != u64::from(expected) {
        return Err(PharError::SizeMismatch {
            entry: header.name.clone(),
            expected,
            actual: data.len() as u64,
        });
    }

    Ok(data)
}
