#![no_main]

use libfuzzer_sys::fuzz_target;
use phar_rs::{ArchiveReader, Options};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Small limits keep each run fast; decoding must never panic
    let options = Options {
        max_manifest_scan_length: 64 * 1024,
        max_metadata_length: 4096,
        max_entry_name_length: 256,
        max_alias_length: 256,
        ..Options::default()
    };
    let reader = match ArchiveReader::with_options(options) {
        Ok(r) => r,
        Err(_) => return,
    };

    let archive = match reader.read_from(Cursor::new(data)) {
        Ok(a) => a,
        Err(err) => {
            let _ = err.kind();
            let _ = err.to_string();
            return;
        }
    };

    // A successful decode must be internally consistent
    for entry in archive.entries() {
        assert_eq!(entry.data.len(), entry.size_uncompressed as usize);
        assert!(archive.entry(&entry.name).is_some());
        let _ = entry.compression();
        let _ = entry.permissions();
    }
    let _ = archive.version.to_string();
});
