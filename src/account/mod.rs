//! Account storage
//!
//! Accounts are the principals allowed to call the storage API. The core only
//! consults them to answer "do these credentials belong to someone?"; the
//! connection metadata (address, port, quota) is carried along for callers.

pub mod credentials;
pub mod sqlite_store;
pub mod mock_store;

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// A persisted storage account
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Account {
    pub username: String,
    /// Argon2 PHC string, never the plaintext secret
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub about: Option<String>,
    pub ip_address: String,
    pub port: u16,
    /// Storage quota in megabytes; informational only
    pub available_megabytes: u64,
}

/// Account registration request carrying the plaintext secret
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub about: Option<String>,
    pub ip_address: String,
    pub port: u16,
    pub available_megabytes: u64,
}

impl NewAccount {
    /// Hash the secret and produce the account to persist
    pub fn into_account(self) -> StorageResult<Account> {
        let password_hash = credentials::hash_secret(&self.password)?;
        Ok(Account {
            username: self.username,
            password_hash,
            about: self.about,
            ip_address: self.ip_address,
            port: self.port,
            available_megabytes: self.available_megabytes,
        })
    }
}

/// Trait defining the account storage interface
pub trait AccountStorage: Send + Sync {
    /// Persist a new account; `AccountExists` when the username is taken
    fn create_account(&self, account: &Account) -> StorageResult<()>;

    /// Look up an account by username
    fn find_account(&self, username: &str) -> StorageResult<Option<Account>>;

    /// All accounts ordered by username
    fn list_accounts(&self) -> StorageResult<Vec<Account>>;
}
