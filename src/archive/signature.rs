//! Whole-file signature trailer
//!
//! ```text
//! [ stub | manifest | entries | payloads ][ digest ][ flag: u32 ][ "GBMB" ]
//! |<------------- hashed bytes --------->|
//! ```
//!
//! The digest covers every byte before it. It is verified against the raw
//! file, independently of how the manifest and entries decoded.

use crate::archive::format::le_u32;
use crate::error::{or_truncated, PharError, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::io::{self, Read, Seek, SeekFrom};
use tracing::debug;

/// Magic constant that ends every archive
pub const SIGNATURE_MAGIC: [u8; 4] = *b"GBMB";

/// Flag and magic that follow the digest
pub const TRAILER_FIXED_SIZE: u64 = 8;

/// Digest algorithms a trailer can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl SignatureAlgorithm {
    /// Map a trailer flag to an algorithm; unknown flags yield `None`
    pub fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0x0001 => Some(Self::Md5),
            0x0002 => Some(Self::Sha1),
            0x0003 => Some(Self::Sha256),
            0x0004 => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn flag(self) -> u32 {
        match self {
            Self::Md5 => 0x0001,
            Self::Sha1 => 0x0002,
            Self::Sha256 => 0x0003,
            Self::Sha512 => 0x0004,
        }
    }

    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Hash exactly `len` bytes from `reader`
    pub fn digest_prefix<R: Read>(self, reader: R, len: u64) -> Result<Vec<u8>> {
        match self {
            Self::Md5 => hash_prefix::<Md5, R>(reader, len),
            Self::Sha1 => hash_prefix::<Sha1, R>(reader, len),
            Self::Sha256 => hash_prefix::<Sha256, R>(reader, len),
            Self::Sha512 => hash_prefix::<Sha512, R>(reader, len),
        }
    }
}

fn hash_prefix<D: Digest, R: Read>(reader: R, len: u64) -> Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut limited = reader.take(len);
    let mut buf = [0u8; 8192];
    let mut hashed: u64 = 0;

    loop {
        let n = match limited.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        hasher.update(&buf[..n]);
        hashed += n as u64;
    }

    if hashed < len {
        return Err(PharError::TruncatedSignature {
            file_size: hashed,
            needed: len,
        });
    }

    Ok(hasher.finalize().to_vec())
}

/// Decoded signature trailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTrailer {
    pub algorithm: SignatureAlgorithm,
    pub digest: Vec<u8>,
}

impl SignatureTrailer {
    /// Read the trailer from the end of a `file_size`-byte source.
    ///
    /// Returns `Ok(None)` when the magic is present but the flag names no
    /// known algorithm.
    pub fn read_from<R: Read + Seek>(mut reader: R, file_size: u64) -> Result<Option<Self>> {
        if file_size < TRAILER_FIXED_SIZE {
            return Err(PharError::TruncatedSignature {
                file_size,
                needed: TRAILER_FIXED_SIZE,
            });
        }

        let truncated = || PharError::TruncatedSignature {
            file_size,
            needed: TRAILER_FIXED_SIZE,
        };
        let mut tail = [0u8; TRAILER_FIXED_SIZE as usize];
        reader.seek(SeekFrom::Start(file_size - TRAILER_FIXED_SIZE))?;
        reader
            .read_exact(&mut tail)
            .map_err(|e| or_truncated(e, truncated))?;

        if tail[4..] != SIGNATURE_MAGIC {
            return Err(PharError::MissingSignatureMagic);
        }

        let flag = le_u32(&tail, 0);
        let Some(algorithm) = SignatureAlgorithm::from_flag(flag) else {
            debug!(flag, "trailer names no known signature algorithm");
            return Ok(None);
        };

        let trailer_size = TRAILER_FIXED_SIZE + algorithm.digest_len() as u64;
        if file_size < trailer_size {
            return Err(PharError::TruncatedSignature {
                file_size,
                needed: trailer_size,
            });
        }

        let mut digest = vec![0u8; algorithm.digest_len()];
        reader.seek(SeekFrom::Start(file_size - trailer_size))?;
        reader.read_exact(&mut digest).map_err(|e| {
            or_truncated(e, || PharError::TruncatedSignature {
                file_size,
                needed: trailer_size,
            })
        })?;

        Ok(Some(Self { algorithm, digest }))
    }

    /// Digest, flag and magic
    pub fn size(&self) -> u64 {
        TRAILER_FIXED_SIZE + self.digest.len() as u64
    }
}

/// Verify the trailer of a `file_size`-byte source.
///
/// Returns the verified algorithm, or `None` when the trailer names no known
/// algorithm. The whole content preceding the trailer is re-read from offset
/// zero.
pub fn verify_signature<R: Read + Seek>(
    mut reader: R,
    file_size: u64,
) -> Result<Option<SignatureAlgorithm>> {
    let Some(trailer) = SignatureTrailer::read_from(&mut reader, file_size)? else {
        return Ok(None);
    };

    let content_length = file_size - trailer.size();
    reader.seek(SeekFrom::Start(0))?;
    let computed = trailer.algorithm.digest_prefix(&mut reader, content_length)?;

    if computed != trailer.digest {
        return Err(PharError::SignatureMismatch {
            algorithm: trailer.algorithm.name(),
            expected: hex::encode(&trailer.digest),
            actual: hex::encode(&computed),
        });
    }

    debug!(
        algorithm = trailer.algorithm.name(),
        content_length, "verified archive signature"
    );
    Ok(Some(trailer.algorithm))
}
