//! Decoder options
//!
//! Every length field read from an archive is untrusted. `Options` carries the
//! bound applied to each of them before any buffer is allocated, along with
//! the stub terminator the manifest locator searches for.
//!
//! Options can be built in code or loaded from a TOML document; fields that
//! are absent keep their defaults.
//!
//! ```
//! use phar_rs::Options;
//!
//! let options = Options::from_toml_str("max_alias_length = 64").unwrap();
//! assert_eq!(options.max_alias_length, 64);
//! assert_eq!(options.max_entry_name_length, 1000);
//! ```

use crate::error::{PharError, Result};
use serde::Deserialize;
use std::path::Path;

/// Stub terminator that ends the executable prologue of a phar
pub const DEFAULT_SENTINEL: &str = "__HALT_COMPILER(); ?>";

/// Size of each window read while searching for the stub terminator
pub const DEFAULT_SCAN_WINDOW: usize = 200;

/// What to do with per-entry metadata blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMetadataPolicy {
    /// Read metadata into [`Entry::metadata`](crate::Entry::metadata)
    #[default]
    Retain,
    /// Consume metadata bytes without keeping them
    Skip,
}

/// Limits and settings for a single decode
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Maximum size of manifest and entry metadata blobs
    pub max_metadata_length: u32,
    /// Maximum number of bytes scanned while looking for the manifest
    pub max_manifest_scan_length: u64,
    /// Maximum length of an entry name
    pub max_entry_name_length: u32,
    /// Maximum length of the archive alias
    pub max_alias_length: u32,
    /// Literal text that ends the prologue
    pub sentinel: String,
    /// Window size for the sentinel scan
    pub scan_window: usize,
    pub entry_metadata: EntryMetadataPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_metadata_length: 10_000,
            max_manifest_scan_length: 100 * 1024 * 1024,
            max_entry_name_length: 1_000,
            max_alias_length: 1_000,
            sentinel: DEFAULT_SENTINEL.to_string(),
            scan_window: DEFAULT_SCAN_WINDOW,
            entry_metadata: EntryMetadataPolicy::Retain,
        }
    }
}

impl Options {
    /// Parse options from a TOML document and validate them
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let options: Self = toml::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check that the options describe a usable decoder
    pub fn validate(&self) -> Result<()> {
        if self.sentinel.is_empty() {
            return Err(PharError::InvalidOptions(
                "sentinel must not be empty".to_string(),
            ));
        }

        if self.scan_window == 0 {
            return Err(PharError::InvalidOptions(
                "scan_window must be greater than zero".to_string(),
            ));
        }

        // A match may straddle at most two windows
        if self.scan_window < self.sentinel.len() {
            return Err(PharError::InvalidOptions(format!(
                "scan_window ({}) is shorter than the sentinel ({} bytes)",
                self.scan_window,
                self.sentinel.len()
            )));
        }

        Ok(())
    }
}
