use crate::archive::format::{
    le_u32, read_bytes, read_u32, skip_bytes, Compression, Entry,
};
use crate::error::{or_truncated, PharError, Result};
use crate::options::{EntryMetadataPolicy, Options};
use std::io::Read;
use tracing::debug;

/// Fixed block that follows each entry name
pub const ENTRY_FIXED_SIZE: usize = 24;

/// Entry header from the manifest's entry table
///
/// Structure (little-endian):
/// - Name Length: uint32 (4 bytes)
/// - Name: variable
/// - Uncompressed Size: uint32 (4 bytes)
/// - Timestamp: uint32 (4 bytes)
/// - Compressed Size: uint32 (4 bytes)
/// - CRC32: uint32 (4 bytes)
/// - Flags: uint32 (4 bytes)
/// - Metadata Length: uint32 (4 bytes)
/// - Metadata: variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: String,
    pub size_uncompressed: u32,
    pub timestamp: u32,
    pub size_compressed: u32,
    pub crc32: u32,
    pub flags: u32,
    pub metadata: Vec<u8>,
}

impl EntryHeader {
    /// Read one entry header. `index` is only used to label errors raised
    /// before the name is known.
    pub fn read_from<R: Read>(mut reader: R, index: u32, options: &Options) -> Result<Self> {
        let name_length = read_u32(&mut reader)
            .map_err(|e| or_truncated(e, || PharError::TruncatedEntryName { index }))?;

        if name_length == 0 {
            return Err(PharError::InvalidEntryName {
                index,
                reason: "empty name".to_string(),
            });
        }
        if name_length > options.max_entry_name_length {
            return Err(PharError::EntryNameTooLong {
                index,
                length: name_length,
                limit: options.max_entry_name_length,
            });
        }

        let name_bytes = read_bytes(&mut reader, u64::from(name_length))
            .map_err(|e| or_truncated(e, || PharError::TruncatedEntryName { index }))?;
        // Names are raw bytes on disk; Latin-1 names still decode
        let name = String::from_utf8_lossy(&name_bytes).into_owned();

        let mut block = [0u8; ENTRY_FIXED_SIZE];
        reader.read_exact(&mut block).map_err(|e| {
            or_truncated(e, || PharError::TruncatedEntryHeader {
                entry: name.clone(),
                field: "fixed fields",
            })
        })?;

        let size_uncompressed = le_u32(&block, 0);
        let timestamp = le_u32(&block, 4);
        let size_compressed = le_u32(&block, 8);
        let crc32 = le_u32(&block, 12);
        let flags = le_u32(&block, 16);
        let metadata_length = le_u32(&block, 20);

        if metadata_length > options.max_metadata_length {
            return Err(PharError::MetadataTooLarge {
                entry: Some(name),
                length: metadata_length,
                limit: options.max_metadata_length,
            });
        }

        let truncated_metadata = || PharError::TruncatedEntryHeader {
            entry: name.clone(),
            field: "metadata",
        };
        let metadata = match options.entry_metadata {
            EntryMetadataPolicy::Retain => read_bytes(&mut reader, u64::from(metadata_length))
                .map_err(|e| or_truncated(e, truncated_metadata))?,
            EntryMetadataPolicy::Skip => {
                skip_bytes(&mut reader, u64::from(metadata_length))
                    .map_err(|e| or_truncated(e, truncated_metadata))?;
                Vec::new()
            }
        };

        Ok(Self {
            name,
            size_uncompressed,
            timestamp,
            size_compressed,
            crc32,
            flags,
            metadata,
        })
    }

    pub fn compression(&self) -> Option<Compression> {
        Compression::from_flags(self.flags)
    }

    /// Combine this header with its verified payload
    pub fn into_entry(self, data: Vec<u8>) -> Entry {
        Entry {
            name: self.name,
            timestamp: self.timestamp,
            size_uncompressed: self.size_uncompressed,
            size_compressed: self.size_compressed,
            crc32: self.crc32,
            flags: self.flags,
            metadata: self.metadata,
            data,
        }
    }
}

/// Read `count` entry headers in stream order.
///
/// `count` comes from the manifest and is not trusted for preallocation; a
/// stream that runs out early fails on the first missing header.
pub fn read_entry_table<R: Read>(
    mut reader: R,
    count: u32,
    options: &Options,
) -> Result<Vec<EntryHeader>> {
    let mut headers = Vec::new();

    for index in 0..count {
        let header = EntryHeader::read_from(&mut reader, index, options)?;
        debug!(
            index,
            name = %header.name,
            size = header.size_uncompressed,
            flags = header.flags,
            "decoded entry header"
        );
        headers.push(header);
    }

    Ok(headers)
}
