//! phar-rs: Decoder and verifier for PHAR self-executing archives
//!
//! A phar is a PHP stub followed by a binary manifest, a table of entry
//! headers, the entry payloads and a signature trailer. This library decodes
//! the whole container in one pass:
//! - Locates the manifest behind the stub terminator
//! - Decodes manifest and entry headers under configurable size limits
//! - Inflates DEFLATE-compressed entries and checks every CRC-32
//! - Verifies the MD5/SHA-1/SHA-256/SHA-512 trailer digest
//!
//! Untrusted length fields are checked against [`Options`] before anything is
//! allocated for them.
//!
//! # Example
//!
//! ```no_run
//! use phar_rs::ArchiveReader;
//!
//! let archive = ArchiveReader::new().open("app.phar")?;
//! for entry in archive.entries() {
//!     println!("{} ({} bytes)", entry.name, entry.data.len());
//! }
//! # Ok::<(), phar_rs::error::PharError>(())
//! ```

// Core modules
pub mod archive;
pub mod error;
pub mod options;

// Re-export commonly used types
pub use archive::{
    Archive, ArchiveReader, Compression, Entry, EntryHeader, Manifest, SignatureAlgorithm,
    Version, SIGNATURE_MAGIC,
};
pub use error::{ErrorKind, PharError, Result};
pub use options::{EntryMetadataPolicy, Options};
