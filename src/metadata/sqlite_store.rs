//! SQLite implementation of MetadataStorage trait

use crate::config::MetadataConfig;
use crate::database::open_connection;
use crate::error::{StorageError, StorageResult};
use crate::metadata::{MetadataStorage, RecordId, RecordMetadata};
use crate::storage::BlobLocation;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use log::debug;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS catalog_record (
    record_id INTEGER PRIMARY KEY,
    blob_offset INTEGER NOT NULL,
    blob_size INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// SQLite implementation of MetadataStorage
pub struct SQLiteMetadataStore {
    conn: Mutex<Connection>,
}

impl SQLiteMetadataStore {
    /// Open the database configured in `config`
    pub fn new(config: &MetadataConfig) -> StorageResult<Self> {
        Self::open(&config.db_path, config.wal_mode)
    }

    pub fn open(db_path: impl AsRef<Path>, wal_mode: bool) -> StorageResult<Self> {
        let conn = open_connection(db_path.as_ref(), wal_mode)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("metadata connection lock poisoned".to_string()))
    }
}

fn row_to_metadata(row: &Row<'_>) -> rusqlite::Result<RecordMetadata> {
    let offset: i64 = row.get(1)?;
    let size: i64 = row.get(2)?;
    Ok(RecordMetadata {
        record_id: row.get(0)?,
        location: BlobLocation::new(offset as u64, size as u64),
        checksum: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl MetadataStorage for SQLiteMetadataStore {
    fn upsert_metadata(&self, metadata: &RecordMetadata) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO catalog_record (record_id, blob_offset, blob_size, checksum, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(record_id) DO UPDATE SET
                blob_offset = excluded.blob_offset,
                blob_size = excluded.blob_size,
                checksum = excluded.checksum,
                updated_at = excluded.updated_at",
            params![
                metadata.record_id,
                metadata.location.offset as i64,
                metadata.location.size as i64,
                metadata.checksum,
                metadata.created_at,
                metadata.updated_at,
            ],
        )?;

        debug!("Upserted metadata for record {}", metadata.record_id);
        Ok(())
    }

    fn get_metadata(&self, record_id: RecordId) -> StorageResult<RecordMetadata> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT record_id, blob_offset, blob_size, checksum, created_at, updated_at
             FROM catalog_record WHERE record_id = ?1",
            params![record_id],
            row_to_metadata,
        )
        .optional()?
        .ok_or(StorageError::NotFound(record_id))
    }

    fn record_exists(&self, record_id: RecordId) -> StorageResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM catalog_record WHERE record_id = ?1",
            params![record_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_records(&self) -> StorageResult<Vec<RecordId>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT record_id FROM catalog_record ORDER BY record_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<RecordId>, _>>()?;
        Ok(ids)
    }
}
