#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content hashing for pkgcheck
//!
//! Two kinds of hashes are used. [`Hash`] is a BLAKE3 digest recorded for
//! every baseline blob a run consumes, so a report states exactly which
//! reference data it was checked against. The [`filtered`] module provides
//! the line-break-insensitive xxh64 fingerprints of the confidential-content
//! index.

pub mod filtered;

pub use filtered::{
    digest_reader, filtered_digest, prefix_digest, FilteredDigest, FilteredHasher, BLOCK_LEN,
    PREFIX_LEN,
};

use serde::{Serialize, Serializer};
use std::fmt;

/// A BLAKE3 hash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash {
    bytes: [u8; 32],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_bytes(*blake3::hash(data).as_bytes())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
