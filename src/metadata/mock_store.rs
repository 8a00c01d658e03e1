//! Mock implementation of MetadataStorage trait for testing

use crate::error::{StorageError, StorageResult};
use crate::metadata::{MetadataStorage, RecordId, RecordMetadata};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Mock implementation of MetadataStorage for testing
pub struct MockMetadataStore {
    data: Mutex<BTreeMap<RecordId, RecordMetadata>>,
}

impl MockMetadataStore {
    /// Create a new mock metadata store
    pub fn new() -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
        }
    }

    /// Clear all data from the store (useful for test cleanup)
    pub fn clear(&self) {
        if let Ok(mut data) = self.data.lock() {
            data.clear();
        }
    }

    /// Get the number of records in the store
    pub fn record_count(&self) -> usize {
        self.data.lock().map(|data| data.len()).unwrap_or(0)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, BTreeMap<RecordId, RecordMetadata>>> {
        self.data
            .lock()
            .map_err(|_| StorageError::Backend("mock metadata lock poisoned".to_string()))
    }
}

impl Default for MockMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStorage for MockMetadataStore {
    fn upsert_metadata(&self, metadata: &RecordMetadata) -> StorageResult<()> {
        let mut data = self.lock()?;

        let mut stored = metadata.clone();
        if let Some(existing) = data.get(&metadata.record_id) {
            stored.created_at = existing.created_at;
        }
        data.insert(metadata.record_id, stored);
        Ok(())
    }

    fn get_metadata(&self, record_id: RecordId) -> StorageResult<RecordMetadata> {
        self.lock()?
            .get(&record_id)
            .cloned()
            .ok_or(StorageError::NotFound(record_id))
    }

    fn record_exists(&self, record_id: RecordId) -> StorageResult<bool> {
        Ok(self.lock()?.contains_key(&record_id))
    }

    fn list_records(&self) -> StorageResult<Vec<RecordId>> {
        Ok(self.lock()?.keys().copied().collect())
    }
}
