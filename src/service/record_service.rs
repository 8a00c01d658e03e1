//! Record service: the id -> payload store built from a blob backend and a
//! metadata backend.

use crate::error::{StorageError, StorageResult};
use crate::metadata::{MetadataStorage, RecordId, RecordMetadata};
use crate::storage::BlobStorage;
use serde::Serialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use log::{debug, error, info};

/// Number of reader/writer locks the record ids are spread over
const LOCK_STRIPES: usize = 64;

/// Upload acknowledgement echoing the stored payload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Feedback {
    pub record_id: RecordId,
    pub bytes: Vec<u8>,
    /// Hex md5 of `bytes`
    pub etag: String,
}

/// A payload together with the metadata it was read under
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub metadata: RecordMetadata,
    pub bytes: Vec<u8>,
}

/// Lower-case hex md5 of a payload
pub fn checksum(payload: &[u8]) -> String {
    hex::encode(md5::compute(payload).0)
}

/// Record store with last-write-wins semantics per id.
///
/// Writes to one id are serialized through a striped lock and readers of the
/// same id wait for an in-flight write to finish. Blob storage is append-only,
/// so an overwrite never touches the bytes a concurrent reader could see.
pub struct RecordService {
    blobs: Arc<dyn BlobStorage>,
    metadata: Arc<dyn MetadataStorage>,
    stripes: Vec<RwLock<()>>,
}

impl RecordService {
    /// Create a new record service with injected backends
    pub fn new(blobs: Arc<dyn BlobStorage>, metadata: Arc<dyn MetadataStorage>) -> Self {
        Self {
            blobs,
            metadata,
            stripes: (0..LOCK_STRIPES).map(|_| RwLock::new(())).collect(),
        }
    }

    fn stripe(&self, record_id: RecordId) -> &RwLock<()> {
        &self.stripes[record_id.rem_euclid(LOCK_STRIPES as i64) as usize]
    }

    fn read_lock(&self, record_id: RecordId) -> StorageResult<RwLockReadGuard<'_, ()>> {
        self.stripe(record_id)
            .read()
            .map_err(|_| StorageError::Backend(format!("lock for record {} poisoned", record_id)))
    }

    fn write_lock(&self, record_id: RecordId) -> StorageResult<RwLockWriteGuard<'_, ()>> {
        self.stripe(record_id)
            .write()
            .map_err(|_| StorageError::Backend(format!("lock for record {} poisoned", record_id)))
    }

    /// Store `payload` under `record_id`, replacing any previous payload
    pub fn put(&self, record_id: RecordId, payload: &[u8]) -> StorageResult<Feedback> {
        let etag = checksum(payload);
        let _guard = self.write_lock(record_id)?;

        let location = self.blobs.write_data(payload)?;
        self.metadata
            .upsert_metadata(&RecordMetadata::new(record_id, location, etag.clone()))
            .map_err(|e| {
                error!("Failed to write metadata for record {}: {}", record_id, e);
                e
            })?;

        info!("Stored record {} ({} bytes at offset {})", record_id, location.size, location.offset);
        Ok(Feedback {
            record_id,
            bytes: payload.to_vec(),
            etag,
        })
    }

    /// Payload currently stored under `record_id`
    pub fn get(&self, record_id: RecordId) -> StorageResult<Vec<u8>> {
        self.get_record(record_id).map(|record| record.bytes)
    }

    /// Payload and metadata read under the same lock
    pub fn get_record(&self, record_id: RecordId) -> StorageResult<StoredRecord> {
        let _guard = self.read_lock(record_id)?;

        let metadata = self.metadata.get_metadata(record_id)?;
        let bytes = self.blobs.read_data(metadata.location)?;

        if checksum(&bytes) != metadata.checksum {
            error!("Checksum mismatch for record {} at offset {}", record_id, metadata.location.offset);
            return Err(StorageError::Corrupted(record_id));
        }

        debug!("Read record {} ({} bytes)", record_id, bytes.len());
        Ok(StoredRecord { metadata, bytes })
    }

    pub fn exists(&self, record_id: RecordId) -> StorageResult<bool> {
        let _guard = self.read_lock(record_id)?;
        self.metadata.record_exists(record_id)
    }

    /// Metadata of the current payload, `NotFound` when absent
    pub fn metadata(&self, record_id: RecordId) -> StorageResult<RecordMetadata> {
        let _guard = self.read_lock(record_id)?;
        self.metadata.get_metadata(record_id)
    }

    pub fn list_records(&self) -> StorageResult<Vec<RecordId>> {
        self.metadata.list_records()
    }
}
