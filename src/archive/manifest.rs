use crate::archive::format::{
    le_u16, le_u32, read_bytes, read_u32, Version, MANIFEST_SIGNATURE_FLAG,
};
use crate::error::{or_truncated, PharError, Result};
use crate::options::Options;
use std::io::Read;
use tracing::debug;

/// Fixed part of the manifest in bytes
pub const MANIFEST_HEADER_SIZE: usize = 18;

/// Binary manifest that follows the stub
///
/// Structure (little-endian):
/// - Manifest Length: uint32 (4 bytes)
/// - Entry Count: uint32 (4 bytes)
/// - API Version: uint16 (2 bytes, nibble packed)
/// - Flags: uint32 (4 bytes)
/// - Alias Length: uint32 (4 bytes)
/// - Alias: variable
/// - Metadata Length: uint32 (4 bytes)
/// - Metadata: variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub total_length: u32,
    pub entry_count: u32,
    pub raw_version: u16,
    pub flags: u32,
    pub alias: Vec<u8>,
    pub metadata_length: u32,
    pub metadata: Vec<u8>,
    pub is_signed: bool,
}

impl Manifest {
    /// Read a manifest from a reader positioned at its first byte.
    ///
    /// Alias and metadata lengths are checked against `options` before the
    /// corresponding buffers are allocated.
    pub fn read_from<R: Read>(mut reader: R, options: &Options) -> Result<Self> {
        let mut header = [0u8; MANIFEST_HEADER_SIZE];
        reader
            .read_exact(&mut header)
            .map_err(|e| or_truncated(e, || PharError::TruncatedManifestHeader))?;

        let total_length = le_u32(&header, 0);
        let entry_count = le_u32(&header, 4);
        let raw_version = le_u16(&header, 8);
        let flags = le_u32(&header, 10);
        let alias_length = le_u32(&header, 14);

        if alias_length > options.max_alias_length {
            return Err(PharError::AliasTooLong {
                length: alias_length,
                limit: options.max_alias_length,
            });
        }
        let alias = read_bytes(&mut reader, u64::from(alias_length))
            .map_err(|e| or_truncated(e, || PharError::TruncatedManifest { field: "alias" }))?;

        let metadata_length = read_u32(&mut reader).map_err(|e| {
            or_truncated(e, || PharError::TruncatedManifest {
                field: "metadata length",
            })
        })?;
        if metadata_length > options.max_metadata_length {
            return Err(PharError::MetadataTooLarge {
                entry: None,
                length: metadata_length,
                limit: options.max_metadata_length,
            });
        }
        let metadata = read_bytes(&mut reader, u64::from(metadata_length)).map_err(|e| {
            or_truncated(e, || PharError::TruncatedManifest { field: "metadata" })
        })?;

        let manifest = Self {
            total_length,
            entry_count,
            raw_version,
            flags,
            alias,
            metadata_length,
            metadata,
            is_signed: flags & MANIFEST_SIGNATURE_FLAG != 0,
        };

        debug!(
            entry_count,
            version = %manifest.version(),
            alias_length,
            metadata_length,
            is_signed = manifest.is_signed,
            "decoded manifest"
        );

        Ok(manifest)
    }

    pub fn version(&self) -> Version {
        Version::from_raw(self.raw_version)
    }
}
