//! Binary Storage Layer Abstraction
//!
//! This module provides an abstraction over blob storage backends. Payloads
//! are appended and addressed by their (offset, size) location, so the
//! record service can swap a local data file for an in-memory store without
//! affecting higher-level code.

pub mod local_store;
pub mod mock_store;


use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// Location of a payload inside a blob store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobLocation {
    /// Offset where the payload starts
    pub offset: u64,
    /// Size of the payload in bytes
    pub size: u64,
}

impl BlobLocation {
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Offset one past the last byte of the payload
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Trait defining the blob storage interface
///
/// Writes are append-only: a location handed out by `write_data` keeps
/// returning the same bytes for the lifetime of the store.
pub trait BlobStorage: Send + Sync {
    /// Append data and return where it was written
    fn write_data(&self, data: &[u8]) -> StorageResult<BlobLocation>;

    /// Read data previously written at `location`
    fn read_data(&self, location: BlobLocation) -> StorageResult<Vec<u8>>;

    /// Total number of bytes appended so far, including unreachable ones
    fn used_bytes(&self) -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_location_end() {
        let location = BlobLocation::new(100, 28);
        assert_eq!(location.end(), 128);
        assert_eq!(BlobLocation::new(7, 0).end(), 7);
    }
}
