mod entry;
mod format;
mod locator;
mod manifest;
mod payload;
mod reader;
mod signature;

pub use entry::{read_entry_table, EntryHeader, ENTRY_FIXED_SIZE};
pub use format::{
    Archive, Compression, Entry, Version, COMPRESSED_BZIP2, COMPRESSED_DEFLATE,
    COMPRESSION_MASK, MANIFEST_SIGNATURE_FLAG, PERMISSION_MASK,
};
pub use locator::locate_manifest;
pub use manifest::{Manifest, MANIFEST_HEADER_SIZE};
pub use payload::extract_payload;
pub use reader::ArchiveReader;
pub use signature::{
    verify_signature, SignatureAlgorithm, SignatureTrailer, SIGNATURE_MAGIC, TRAILER_FIXED_SIZE,
};
