//! Test fixture builder
//!
//! Assembles phar archives byte-for-byte: stub, manifest, entry table,
//! payloads and trailer.

#![allow(dead_code)]

use flate2::write::DeflateEncoder;
use phar_rs::{SignatureAlgorithm, SIGNATURE_MAGIC};
use std::io::Write;
use tempfile::NamedTempFile;

pub const STUB: &[u8] = b"<?php\nPhar::mapPhar('test.phar');\n__HALT_COMPILER(); ?>\r\n";

/// Fields of an entry-table record, for patching built archives
#[derive(Debug, Clone, Copy)]
pub enum EntryField {
    NameLength,
    SizeUncompressed,
    Timestamp,
    SizeCompressed,
    Crc32,
    Flags,
    MetadataLength,
}

pub struct FixtureEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub metadata: Vec<u8>,
    pub timestamp: u32,
    pub deflate: bool,
}

pub struct Fixture {
    pub stub: Vec<u8>,
    pub raw_version: u16,
    pub flags: u32,
    pub alias: Vec<u8>,
    pub metadata: Vec<u8>,
    pub entries: Vec<FixtureEntry>,
    /// Trailer flag; `None` writes an unknown flag with no digest
    pub signature: Option<SignatureAlgorithm>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            stub: STUB.to_vec(),
            raw_version: 0x0011,
            flags: 0,
            alias: Vec::new(),
            metadata: Vec::new(),
            entries: Vec::new(),
            signature: None,
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = alias.as_bytes().to_vec();
        self
    }

    pub fn metadata(mut self, metadata: &[u8]) -> Self {
        self.metadata = metadata.to_vec();
        self
    }

    pub fn signed(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature = Some(algorithm);
        self.flags |= 0x0001_0000;
        self
    }

    pub fn file(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, b"", false)
    }

    pub fn file_with_metadata(self, name: &str, data: &[u8], metadata: &[u8]) -> Self {
        self.push(name, data, metadata, false)
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, b"", true)
    }

    fn push(mut self, name: &str, data: &[u8], metadata: &[u8], deflate: bool) -> Self {
        self.entries.push(FixtureEntry {
            name: name.to_string(),
            data: data.to_vec(),
            metadata: metadata.to_vec(),
            timestamp: 1_700_000_000,
            deflate,
        });
        self
    }

    /// Offset of the first payload byte
    pub fn payload_offset(&self) -> usize {
        self.stub.len() + 4 + self.manifest_body().len()
    }

    /// Offset of `field` in the entry-table record of entry `index`
    pub fn entry_field_offset(&self, index: usize, field: EntryField) -> usize {
        // stub, manifest length, count, version, flags, alias, metadata
        let mut offset =
            self.stub.len() + 4 + 4 + 2 + 4 + 4 + self.alias.len() + 4 + self.metadata.len();
        for entry in &self.entries[..index] {
            offset += 4 + entry.name.len() + 24 + entry.metadata.len();
        }

        let name_end = 4 + self.entries[index].name.len();
        offset
            + match field {
                EntryField::NameLength => 0,
                EntryField::SizeUncompressed => name_end,
                EntryField::Timestamp => name_end + 4,
                EntryField::SizeCompressed => name_end + 8,
                EntryField::Crc32 => name_end + 12,
                EntryField::Flags => name_end + 16,
                EntryField::MetadataLength => name_end + 20,
            }
    }

    /// Build, then overwrite one u32 field of entry `index`
    pub fn build_patched(&self, index: usize, field: EntryField, value: u32) -> Vec<u8> {
        let mut data = self.build();
        let at = self.entry_field_offset(index, field);
        data[at..at + 4].copy_from_slice(&value.to_le_bytes());
        data
    }

    fn stored(entry: &FixtureEntry) -> Vec<u8> {
        if entry.deflate {
            let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::best());
            encoder.write_all(&entry.data).unwrap();
            encoder.finish().unwrap()
        } else {
            entry.data.clone()
        }
    }

    fn manifest_body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        body.extend_from_slice(&self.raw_version.to_le_bytes());
        body.extend_from_slice(&self.flags.to_le_bytes());
        body.extend_from_slice(&(self.alias.len() as u32).to_le_bytes());
        body.extend_from_slice(&self.alias);
        body.extend_from_slice(&(self.metadata.len() as u32).to_le_bytes());
        body.extend_from_slice(&self.metadata);

        for entry in &self.entries {
            let stored = Self::stored(entry);
            let flags: u32 = if entry.deflate { 0x1000 | 0x01B6 } else { 0x01B6 };

            body.extend_from_slice(&(entry.name.len() as u32).to_le_bytes());
            body.extend_from_slice(entry.name.as_bytes());
            body.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            body.extend_from_slice(&entry.timestamp.to_le_bytes());
            body.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            body.extend_from_slice(&crc32fast::hash(&entry.data).to_le_bytes());
            body.extend_from_slice(&flags.to_le_bytes());
            body.extend_from_slice(&(entry.metadata.len() as u32).to_le_bytes());
            body.extend_from_slice(&entry.metadata);
        }
        body
    }

    pub fn build(&self) -> Vec<u8> {
        let body = self.manifest_body();

        let mut data = self.stub.clone();
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend_from_slice(&body);
        for entry in &self.entries {
            data.extend_from_slice(&Self::stored(entry));
        }

        match self.signature {
            Some(algorithm) => {
                let digest = algorithm
                    .digest_prefix(&data[..], data.len() as u64)
                    .unwrap();
                data.extend_from_slice(&digest);
                data.extend_from_slice(&algorithm.flag().to_le_bytes());
            }
            None => data.extend_from_slice(&0u32.to_le_bytes()),
        }
        data.extend_from_slice(&SIGNATURE_MAGIC);
        data
    }

    pub fn write_temp(&self) -> NamedTempFile {
        write_temp(&self.build())
    }
}

pub fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// Two stored entries, SHA-1 trailer, serialized PHP metadata
pub fn simple() -> Fixture {
    Fixture::new()
        .metadata(b"a:1:{s:1:\"a\";i:123;}")
        .file("1.txt", b"ASDF")
        .file("index.php", b"ZXCV")
        .signed(SignatureAlgorithm::Sha1)
}
