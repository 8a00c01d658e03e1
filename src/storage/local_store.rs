//! Local file blob storage implementation

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::{BlobLocation, BlobStorage};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use log::{debug, info};

/// Append-only blob store backed by a single data file
pub struct LocalFileBlobStore {
    // Writes and reads share one handle; the mutex keeps seek+io pairs atomic
    file: Mutex<File>,
    data_path: PathBuf,
}

impl LocalFileBlobStore {
    /// Open (or create) the data file configured in `config`
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        Self::open(&config.data_path)
    }

    pub fn open(data_path: impl AsRef<Path>) -> StorageResult<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        if let Some(parent) = data_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .append(false)  // seek to the end ourselves so the offset is known
            .open(&data_path)?;

        info!("Using blob data file: {}", data_path.display());
        Ok(Self {
            file: Mutex::new(file),
            data_path,
        })
    }

    fn lock_file(&self) -> StorageResult<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| StorageError::Backend("blob file lock poisoned".to_string()))
    }
}

impl BlobStorage for LocalFileBlobStore {
    fn write_data(&self, data: &[u8]) -> StorageResult<BlobLocation> {
        let mut file = self.lock_file()?;

        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_data()?;

        let location = BlobLocation::new(offset, data.len() as u64);
        debug!("Wrote {} bytes at offset {}", location.size, location.offset);
        Ok(location)
    }

    fn read_data(&self, location: BlobLocation) -> StorageResult<Vec<u8>> {
        let mut file = self.lock_file()?;

        let file_len = file.metadata()?.len();
        if location.end() > file_len {
            return Err(StorageError::Backend(format!(
                "location {}+{} is past the end of {} ({} bytes)",
                location.offset, location.size, self.data_path.display(), file_len
            )));
        }

        file.seek(SeekFrom::Start(location.offset))?;
        let mut buffer = vec![0u8; location.size as usize];
        file.read_exact(&mut buffer)?;

        debug!("Read {} bytes from offset {}", location.size, location.offset);
        Ok(buffer)
    }

    fn used_bytes(&self) -> StorageResult<u64> {
        let file = self.lock_file()?;
        Ok(file.metadata()?.len())
    }
}
