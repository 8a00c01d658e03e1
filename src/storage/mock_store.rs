//! Mock implementation of BlobStorage for testing

use crate::error::{StorageError, StorageResult};
use crate::storage::{BlobLocation, BlobStorage};
use std::collections::BTreeMap;
use std::sync::Mutex;
use log::debug;

#[derive(Default)]
struct MockBlobs {
    // (virtual offset, size) -> chunk; empty chunks share an offset with the next write
    chunks: BTreeMap<(u64, u64), Vec<u8>>,
    next_offset: u64,
}

/// In-memory blob store that hands out virtual offsets
pub struct MockBlobStore {
    inner: Mutex<MockBlobs>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockBlobs::default()),
        }
    }

    /// Number of chunks written so far
    pub fn chunk_count(&self) -> usize {
        self.inner.lock().map(|blobs| blobs.chunks.len()).unwrap_or(0)
    }

    /// Clear all data from the store
    pub fn clear(&self) {
        if let Ok(mut blobs) = self.inner.lock() {
            *blobs = MockBlobs::default();
        }
    }

    /// Flip the first byte of the chunk at `location`, for checksum tests
    pub fn corrupt(&self, location: BlobLocation) -> bool {
        let Ok(mut blobs) = self.inner.lock() else {
            return false;
        };
        match blobs
            .chunks
            .get_mut(&(location.offset, location.size))
            .and_then(|chunk| chunk.first_mut())
        {
            Some(byte) => {
                *byte = byte.wrapping_add(1);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, MockBlobs>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Backend("mock blob lock poisoned".to_string()))
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStorage for MockBlobStore {
    fn write_data(&self, data: &[u8]) -> StorageResult<BlobLocation> {
        let mut blobs = self.lock()?;

        let location = BlobLocation::new(blobs.next_offset, data.len() as u64);
        blobs.chunks.insert((location.offset, location.size), data.to_vec());
        blobs.next_offset = location.end();

        debug!("Mock: wrote chunk at virtual offset {} with size {}", location.offset, location.size);
        Ok(location)
    }

    fn read_data(&self, location: BlobLocation) -> StorageResult<Vec<u8>> {
        let blobs = self.lock()?;

        match blobs.chunks.get(&(location.offset, location.size)) {
            Some(chunk) => Ok(chunk.clone()),
            None => Err(StorageError::Backend(format!(
                "mock: no chunk at offset {} with size {}",
                location.offset, location.size
            ))),
        }
    }

    fn used_bytes(&self) -> StorageResult<u64> {
        Ok(self.lock()?.next_offset)
    }
}
