//! Stub terminator scan
//!
//! A phar starts with an executable stub of arbitrary length. The binary
//! manifest begins right after the stub terminator (`__HALT_COMPILER(); ?>`
//! by default) and an optional `\r\n` or `\n`.

use crate::error::{PharError, Result};
use crate::options::Options;
use std::io::{self, Read};
use tracing::{debug, trace};

/// Find the byte offset at which the manifest begins.
///
/// The offset is relative to the reader's position on entry. The reader is
/// left somewhere past the terminator; callers seek to the returned offset.
///
/// Scanning reads `options.scan_window` bytes at a time and searches the
/// previous window joined with the current one, so a terminator split across
/// two reads is still found.
pub fn locate_manifest<R: Read>(mut reader: R, options: &Options) -> Result<u64> {
    let sentinel = options.sentinel.as_bytes();
    let mut previous: Vec<u8> = Vec::with_capacity(options.scan_window);
    let mut current = vec![0u8; options.scan_window];
    // Bytes consumed before the current window
    let mut position: u64 = 0;

    loop {
        let n = fill_window(&mut reader, &mut current)?;
        if n == 0 {
            return Err(PharError::SentinelNotFound { scanned: position });
        }
        trace!(position, n, "scanning window for stub terminator");

        let mut search = Vec::with_capacity(previous.len() + n);
        search.extend_from_slice(&previous);
        search.extend_from_slice(&current[..n]);
        let search_start = position - previous.len() as u64;

        if let Some(index) = find(&search, sentinel) {
            let end = index + sentinel.len();
            let mut offset = search_start + end as u64;

            let mut lookahead = [0u8; 2];
            let available = (search.len() - end).min(2);
            lookahead[..available].copy_from_slice(&search[end..end + available]);
            if available < 2 {
                reader
                    .read_exact(&mut lookahead[available..])
                    .map_err(|err| match err.kind() {
                        io::ErrorKind::UnexpectedEof => {
                            PharError::UnexpectedEndOfInput { offset }
                        }
                        _ => PharError::Io(err),
                    })?;
            }

            match lookahead {
                [b'\r', b'\n'] => offset += 2,
                [b'\n', _] => offset += 1,
                _ => {}
            }

            debug!(offset, "located manifest");
            return Ok(offset);
        }

        position += n as u64;
        if position > options.max_manifest_scan_length {
            return Err(PharError::ManifestTooLarge {
                limit: options.max_manifest_scan_length,
            });
        }

        previous.clear();
        previous.extend_from_slice(&current[..n]);
    }
}

/// Read until `buf` is full or the stream ends; returns the byte count
fn fill_window<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
