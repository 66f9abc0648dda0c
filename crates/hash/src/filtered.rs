//! Line-break-insensitive content fingerprints
//!
//! Content is hashed with every `\r` and `\n` byte removed, so a file matches
//! its baseline regardless of line-ending conversion. The filtered bytes are
//! zero-padded to the next multiple of [`BLOCK_LEN`] before xxh64 (seed 0)
//! runs over them. Published baselines were produced over that exact padded
//! sequence; hashing the unpadded bytes gives different values.

use std::io::{self, Read};
use xxhash_rust::xxh64::Xxh64;

/// Raw bytes examined for the prefix fingerprint
pub const PREFIX_LEN: usize = 1024;

/// Padding granularity of the hashed buffer
pub const BLOCK_LEN: usize = 32;

const SEED: u64 = 0;
const CHUNK_SIZE: usize = 64 * 1024;

/// Hash and length of line-break-filtered content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilteredDigest {
    pub hash: u64,
    /// Length after filtering, before padding
    pub len: u64,
}

/// Incremental filtered hashing
#[derive(Clone)]
pub struct FilteredHasher {
    inner: Xxh64,
    len: u64,
    scratch: Vec<u8>,
}

impl Default for FilteredHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl FilteredHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Xxh64::new(SEED),
            len: 0,
            scratch: Vec::new(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.scratch.clear();
        self.scratch
            .extend(bytes.iter().copied().filter(|b| *b != b'\r' && *b != b'\n'));
        self.inner.update(&self.scratch);
        self.len += self.scratch.len() as u64;
    }

    #[must_use]
    pub fn finish(mut self) -> FilteredDigest {
        let rem = usize::try_from(self.len % BLOCK_LEN as u64).unwrap_or(0);
        if rem != 0 {
            self.inner.update(&[0u8; BLOCK_LEN][..BLOCK_LEN - rem]);
        }
        FilteredDigest {
            hash: self.inner.digest(),
            len: self.len,
        }
    }
}

/// Fingerprint of a whole buffer
#[must_use]
pub fn filtered_digest(bytes: &[u8]) -> FilteredDigest {
    let mut hasher = FilteredHasher::new();
    hasher.update(bytes);
    hasher.finish()
}

/// Fingerprint of the first [`PREFIX_LEN`] raw bytes
#[must_use]
pub fn prefix_digest(bytes: &[u8]) -> FilteredDigest {
    filtered_digest(&bytes[..bytes.len().min(PREFIX_LEN)])
}

/// Fingerprint of everything a reader yields
///
/// # Errors
/// Returns any I/O error from the reader.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<FilteredDigest> {
    let mut hasher = FilteredHasher::new();
    let mut buffer = vec![0; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finish())
}
