use crate::archive::signature::SignatureAlgorithm;
use std::fmt;
use std::io::{self, Read};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Manifest flag bit set by writers that append a signature trailer
pub const MANIFEST_SIGNATURE_FLAG: u32 = 0x0001_0000;

/// Entry flag bits selecting the compression method
pub const COMPRESSION_MASK: u32 = 0x0000_F000;

/// Entry stored as a raw DEFLATE stream
pub const COMPRESSED_DEFLATE: u32 = 0x0000_1000;

/// Entry stored as a bzip2 stream
pub const COMPRESSED_BZIP2: u32 = 0x0000_2000;

/// Entry flag bits holding Unix permissions
pub const PERMISSION_MASK: u32 = 0x0000_01FF;

/// Upper bound on a single up-front allocation for a length-prefixed read
const READ_CHUNK: u64 = 64 * 1024;

/// Compression methods an entry can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Deflate,
    Bzip2,
}

impl Compression {
    /// Extract the compression method from entry flags
    ///
    /// Returns `None` for bit combinations no writer produces.
    pub fn from_flags(flags: u32) -> Option<Self> {
        match flags & COMPRESSION_MASK {
            0 => Some(Self::None),
            COMPRESSED_DEFLATE => Some(Self::Deflate),
            COMPRESSED_BZIP2 => Some(Self::Bzip2),
            _ => None,
        }
    }
}

/// Archive API version packed into the manifest as three nibbles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    /// Split a raw manifest version: major is the low nibble, then minor, then patch
    pub fn from_raw(raw: u16) -> Self {
        Self {
            major: (raw & 0x0F) as u8,
            minor: ((raw >> 4) & 0x0F) as u8,
            patch: ((raw >> 8) & 0x0F) as u8,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A fully decoded phar archive
#[derive(Debug, Clone)]
pub struct Archive {
    pub alias: String,
    pub metadata: Vec<u8>,
    pub version: Version,
    pub entries: Vec<Entry>,
    /// Algorithm of the verified trailer digest, if the trailer carried one
    pub signature: Option<SignatureAlgorithm>,
}

impl Archive {
    /// Entries in on-disk order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up an entry by name
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a recognised trailer digest was verified
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// One file stored in the archive, with its verified contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Modification time, seconds since the Unix epoch
    pub timestamp: u32,
    pub size_uncompressed: u32,
    pub size_compressed: u32,
    pub crc32: u32,
    pub flags: u32,
    pub metadata: Vec<u8>,
    pub data: Vec<u8>,
}

impl Entry {
    /// Unix permission bits
    pub fn permissions(&self) -> u32 {
        self.flags & PERMISSION_MASK
    }

    pub fn compression(&self) -> Option<Compression> {
        Compression::from_flags(self.flags)
    }

    pub fn modified(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(u64::from(self.timestamp))
    }
}

// Helpers for decoding fixed-layout blocks
pub(crate) fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

pub(crate) fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

pub(crate) fn read_u32<R: Read>(mut reader: R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read exactly `len` bytes without trusting `len` for the allocation size.
///
/// The buffer grows as bytes actually arrive, so a lying length field on a
/// short stream fails with `UnexpectedEof` instead of allocating up front.
pub(crate) fn read_bytes<R: Read>(reader: R, len: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(READ_CHUNK) as usize);
    reader.take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(buf)
}

/// Consume exactly `len` bytes, discarding them
pub(crate) fn skip_bytes<R: Read>(reader: R, len: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.take(len), &mut io::sink())?;
    if skipped < len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}
