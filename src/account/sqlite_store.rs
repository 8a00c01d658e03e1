//! SQLite implementation of AccountStorage trait

use crate::account::{Account, AccountStorage};
use crate::config::AccountConfig;
use crate::database::open_connection;
use crate::error::{StorageError, StorageResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use log::info;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS storage_user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    about TEXT,
    ip_address TEXT NOT NULL,
    port INTEGER NOT NULL,
    available_megabytes INTEGER NOT NULL
)";

const SELECT_COLUMNS: &str = "SELECT username, password, about, ip_address, port, available_megabytes FROM storage_user";

/// SQLite implementation of AccountStorage
pub struct SQLiteAccountStore {
    conn: Mutex<Connection>,
}

impl SQLiteAccountStore {
    pub fn new(config: &AccountConfig) -> StorageResult<Self> {
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
            .map_err(|_| StorageError::Backend("account connection lock poisoned".to_string()))
    }
}

/// Read an INTEGER column into a narrower unsigned type, rejecting values
/// that do not fit instead of wrapping them
fn unsigned_column<T: TryFrom<i64>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let value: i64 = row.get(idx)?;
    T::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        username: row.get(0)?,
        password_hash: row.get(1)?,
        about: row.get(2)?,
        ip_address: row.get(3)?,
        port: unsigned_column(row, 4)?,
        available_megabytes: unsigned_column(row, 5)?,
    })
}

impl AccountStorage for SQLiteAccountStore {
    fn create_account(&self, account: &Account) -> StorageResult<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO storage_user (username, password, about, ip_address, port, available_megabytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.username,
                account.password_hash,
                account.about,
                account.ip_address,
                account.port as i64,
                account.available_megabytes as i64,
            ],
        );

        match result {
            Ok(_) => {
                info!("Created account {}", account.username);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::AccountExists(account.username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_account(&self, username: &str) -> StorageResult<Option<Account>> {
        let conn = self.lock()?;
        let account = conn
            .query_row(
                &format!("{} WHERE username = ?1", SELECT_COLUMNS),
                params![username],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    fn list_accounts(&self) -> StorageResult<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY username", SELECT_COLUMNS))?;
        let accounts = stmt
            .query_map([], row_to_account)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }
}
