//! Mock implementation of AccountStorage trait for testing

use crate::account::{Account, AccountStorage};
use crate::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

pub struct MockAccountStore {
    accounts: Mutex<BTreeMap<String, Account>>,
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().map(|accounts| accounts.len()).unwrap_or(0)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, BTreeMap<String, Account>>> {
        self.accounts
            .lock()
            .map_err(|_| StorageError::Backend("mock account lock poisoned".to_string()))
    }
}

impl Default for MockAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStorage for MockAccountStore {
    fn create_account(&self, account: &Account) -> StorageResult<()> {
        let mut accounts = self.lock()?;
        if accounts.contains_key(&account.username) {
            return Err(StorageError::AccountExists(account.username.clone()));
        }
        accounts.insert(account.username.clone(), account.clone());
        Ok(())
    }

    fn find_account(&self, username: &str) -> StorageResult<Option<Account>> {
        Ok(self.lock()?.get(username).cloned())
    }

    fn list_accounts(&self) -> StorageResult<Vec<Account>> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
