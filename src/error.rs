use std::io;
use thiserror::Error;

/// Result type for phar operations
pub type Result<T> = std::result::Result<T, PharError>;

/// Unified error type for all phar decode operations
///
/// Every variant is terminal for the decode call that produced it.
#[derive(Debug, Error)]
pub enum PharError {
    // Prologue / locator errors
    #[error("Stub terminator not found after scanning {scanned} bytes")]
    SentinelNotFound { scanned: u64 },

    #[error("Unexpected end of input after stub terminator at offset {offset}")]
    UnexpectedEndOfInput { offset: u64 },

    #[error("Manifest not found within the first {limit} bytes")]
    ManifestTooLarge { limit: u64 },

    // Manifest errors
    #[error("Truncated manifest header")]
    TruncatedManifestHeader,

    #[error("Truncated manifest: can't read {field}")]
    TruncatedManifest { field: &'static str },

    #[error("Manifest alias is {length} bytes (max {limit})")]
    AliasTooLong { length: u32, limit: u32 },

    #[error(
        "Metadata of {} is {} bytes (max {})",
        .entry.as_deref().unwrap_or("manifest"),
        .length,
        .limit
    )]
    MetadataTooLarge {
        entry: Option<String>,
        length: u32,
        limit: u32,
    },

    // Entry table errors
    #[error("Truncated name of entry #{index}")]
    TruncatedEntryName { index: u32 },

    #[error("Truncated entry header for {entry}: can't read {field}")]
    TruncatedEntryHeader { entry: String, field: &'static str },

    #[error("Invalid name for entry #{index}: {reason}")]
    InvalidEntryName { index: u32, reason: String },

    #[error("Name of entry #{index} is {length} bytes (max {limit})")]
    EntryNameTooLong { index: u32, length: u32, limit: u32 },

    // Payload errors
    #[error("Truncated data for entry {entry}: expected {expected} bytes")]
    TruncatedEntryData { entry: String, expected: u32 },

    #[error("Unsupported compression for entry {entry}: flags {flags:#010x}")]
    UnsupportedCompression { entry: String, flags: u32 },

    #[error("Decompression failed for entry {entry}: {reason}")]
    DecompressionFailed { entry: String, reason: String },

    #[error("Size mismatch for entry {entry}: declared {expected} bytes, inflated {actual}")]
    SizeMismatch {
        entry: String,
        expected: u32,
        actual: u64,
    },

    #[error("CRC mismatch for entry {entry}: expected {expected:08x}, got {actual:08x}")]
    ChecksumFailed {
        entry: String,
        expected: u32,
        actual: u32,
    },

    // Signature errors
    #[error("Truncated signature trailer: file is {file_size} bytes, trailer needs {needed}")]
    TruncatedSignature { file_size: u64, needed: u64 },

    #[error("Can't find GBMB constant at the end of the archive")]
    MissingSignatureMagic,

    #[error("{algorithm} hash of file is incorrect: stored {expected}, computed {actual}")]
    SignatureMismatch {
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    // Configuration errors
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("TOML error: {0}")]
    TomlError(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of [`PharError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The stream ended in the middle of a field
    TruncatedInput,
    /// A length field exceeded its configured maximum
    LimitExceeded,
    /// A field held a value that is invalid for the format
    InvalidEntry,
    ChecksumFailed,
    UnsupportedCompression,
    SizeMismatch,
    MissingSignatureMagic,
    SignatureMismatch,
    Io,
    Configuration,
}

impl PharError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SentinelNotFound { .. }
            | Self::UnexpectedEndOfInput { .. }
            | Self::TruncatedManifestHeader
            | Self::TruncatedManifest { .. }
            | Self::TruncatedEntryName { .. }
            | Self::TruncatedEntryHeader { .. }
            | Self::TruncatedEntryData { .. }
            | Self::TruncatedSignature { .. } => ErrorKind::TruncatedInput,

            Self::ManifestTooLarge { .. }
            | Self::AliasTooLong { .. }
            | Self::MetadataTooLarge { .. }
            | Self::EntryNameTooLong { .. } => ErrorKind::LimitExceeded,

            Self::InvalidEntryName { .. } | Self::DecompressionFailed { .. } => ErrorKind::InvalidEntry,

            Self::ChecksumFailed { .. } => ErrorKind::ChecksumFailed,
            Self::UnsupportedCompression { .. } => ErrorKind::UnsupportedCompression,
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Self::MissingSignatureMagic => ErrorKind::MissingSignatureMagic,
            Self::SignatureMismatch { .. } => ErrorKind::SignatureMismatch,
            Self::InvalidOptions(_) | Self::TomlError(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<toml::de::Error> for PharError {
    fn from(err: toml::de::Error) -> Self {
        PharError::TomlError(err.to_string())
    }
}

/// Map an I/O failure onto a named truncation error.
///
/// Only `UnexpectedEof` becomes the truncation variant; any other failure
/// stays an I/O error.
pub(crate) fn or_truncated<F>(err: io::Error, truncated: F) -> PharError
where
    F: FnOnce() -> PharError,
{
    if err.kind() == io::ErrorKind::UnexpectedEof {
        truncated()
    } else {
        PharError::Io(err)
    }
}
