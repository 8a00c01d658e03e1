//! database.rs
//!
//! SQLite connection setup shared by the metadata and account stores.

use crate::error::StorageResult;
use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database file at `db_path`, creating parent directories as needed
pub fn open_connection(db_path: &Path, wal_mode: bool) -> StorageResult<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    if wal_mode {
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            warn!("Requested WAL mode for {} but journal_mode is {}", db_path.display(), mode);
        }
    }

    info!("Opened SQLite database {} (wal_mode: {})", db_path.display(), wal_mode);
    Ok(conn)
}
