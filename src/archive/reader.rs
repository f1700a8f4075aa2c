use crate::archive::entry::read_entry_table;
use crate::archive::format::{Archive, Version};
use crate::archive::locator::locate_manifest;
use crate::archive::manifest::Manifest;
use crate::archive::payload::extract_payload;
use crate::archive::signature::verify_signature;
use crate::error::Result;
use crate::options::Options;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// Decodes phar archives under a fixed set of [`Options`]
///
/// A reader holds no per-archive state, so one reader can decode any number
/// of archives, including from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct ArchiveReader {
    options: Options,
}

impl ArchiveReader {
    /// Create a reader with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader with custom options
    pub fn with_options(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Options this reader decodes under
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Open and decode an archive file
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Archive> {
        let file = File::open(path)?;
        self.read_from(BufReader::new(file))
    }

    /// Decode an archive from any seekable source.
    ///
    /// Decoding always starts at offset zero. Every entry is decompressed and
    /// CRC-checked, then the trailer digest is verified over the raw bytes.
    ///
    /// The first failing step decides the error. Structural and payload
    /// checks run before the trailer, so a damaged signed archive reports
    /// [`SignatureMismatch`](crate::PharError::SignatureMismatch) only when
    /// the damage sits where nothing else looks: the stub, opaque metadata
    /// or fields that are decoded but not checked. A flipped payload byte
    /// reports `ChecksumFailed`; a flipped length field usually reports a
    /// truncation or limit error. Call
    /// [`verify_signature`](crate::archive::verify_signature) directly to
    /// check only the digest.
    pub fn read_from<R: Read + Seek>(&self, mut source: R) -> Result<Archive> {
        source.seek(SeekFrom::Start(0))?;
        let manifest_offset = locate_manifest(&mut source, &self.options)?;

        source.seek(SeekFrom::Start(manifest_offset))?;
        let manifest = Manifest::read_from(&mut source, &self.options)?;

        let headers = read_entry_table(&mut source, manifest.entry_count, &self.options)?;

        let mut entries = Vec::with_capacity(headers.len());
        for header in headers {
            let data = extract_payload(&mut source, &header)?;
            entries.push(header.into_entry(data));
        }

        let file_size = source.seek(SeekFrom::End(0))?;
        let signature = verify_signature(&mut source, file_size)?;
        if manifest.is_signed && signature.is_none() {
            warn!("manifest declares a signature but the trailer names no known algorithm");
        }

        let version = Version::from_raw(manifest.raw_version);
        let alias = String::from_utf8_lossy(&manifest.alias).into_owned();

        debug!(
            %alias,
            %version,
            entries = entries.len(),
            signed = signature.is_some(),
            "decoded archive"
        );

        Ok(Archive {
            alias,
            metadata: manifest.metadata,
            version,
            entries,
            signature,
        })
    }
}
