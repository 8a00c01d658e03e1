//! Metadata Storage Layer Abstraction
//!
//! This module maps catalog record ids to the blob location of their current
//! payload. Backends (SQLite, in-memory) are interchangeable behind the
//! `MetadataStorage` trait.

pub mod sqlite_store;
pub mod mock_store;


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::storage::BlobLocation;

/// Externally supplied catalog record identifier
pub type RecordId = i64;

/// Metadata associated with the current payload of a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    pub record_id: RecordId,
    /// Where the payload lives in blob storage
    pub location: BlobLocation,
    /// Lower-case hex md5 of the payload
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordMetadata {
    /// Metadata for a payload written just now
    pub fn new(record_id: RecordId, location: BlobLocation, checksum: String) -> Self {
        let now = Utc::now();
        Self {
            record_id,
            location,
            checksum,
            created_at: now,
            updated_at: now,
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> u64 {
        self.location.size
    }
}

/// Trait defining the metadata storage interface
pub trait MetadataStorage: Send + Sync {
    /// Insert metadata, or replace it when the record already exists.
    /// An existing record keeps its original `created_at`.
    fn upsert_metadata(&self, metadata: &RecordMetadata) -> StorageResult<()>;

    /// Retrieve metadata for a record, `NotFound` when absent
    fn get_metadata(&self, record_id: RecordId) -> StorageResult<RecordMetadata>;

    /// Check if a record exists
    fn record_exists(&self, record_id: RecordId) -> StorageResult<bool>;

    /// All stored record ids in ascending order
    fn list_records(&self) -> StorageResult<Vec<RecordId>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metadata_new_sets_matching_timestamps() {
        let metadata = RecordMetadata::new(11, BlobLocation::new(0, 9), "abc".to_string());

        assert_eq!(metadata.record_id, 11);
        assert_eq!(metadata.size(), 9);
        assert_eq!(metadata.created_at, metadata.updated_at);
    }

    #[test]
    fn test_record_metadata_serializes_location() {
        let metadata = RecordMetadata::new(21, BlobLocation::new(40, 2), "ff".to_string());
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["record_id"], 21);
        assert_eq!(json["location"]["offset"], 40);
        assert_eq!(json["location"]["size"], 2);
    }
}
