//! Access gateway: authenticates callers before any record store access.

use crate::account::{credentials, Account, AccountStorage, NewAccount};
use crate::error::{StorageError, StorageResult};
use crate::metadata::{RecordId, RecordMetadata};
use crate::service::record_service::{Feedback, RecordService, StoredRecord};
use std::sync::Arc;
use log::{debug, info, warn};

/// Proof that a caller passed `AccessGateway::authenticate`.
///
/// Only the gateway can construct one, so the record operations below cannot
/// be reached with unchecked credentials.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    account: Account,
}

impl AuthenticatedAccount {
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn username(&self) -> &str {
        &self.account.username
    }
}

pub struct AccessGateway {
    accounts: Arc<dyn AccountStorage>,
    records: Arc<RecordService>,
}

impl AccessGateway {
    pub fn new(accounts: Arc<dyn AccountStorage>, records: Arc<RecordService>) -> Self {
        Self { accounts, records }
    }

    /// Validate a username/secret pair
    ///
    /// Unknown usernames and wrong secrets fail the same way, and both pay
    /// for a full hash verification.
    pub fn authenticate(&self, username: &str, secret: &str) -> StorageResult<AuthenticatedAccount> {
        let account = self.accounts.find_account(username)?;
        let stored_hash = account
            .as_ref()
            .map_or(credentials::UNKNOWN_ACCOUNT_HASH, |account| account.password_hash.as_str());
        let verified = credentials::verify_secret(secret, stored_hash);

        match account {
            Some(account) if verified => {
                debug!("Authenticated user {}", username);
                Ok(AuthenticatedAccount { account })
            }
            Some(_) => {
                warn!("Authentication failed: wrong secret for user {}", username);
                Err(StorageError::Unauthorized)
            }
            None => {
                warn!("Authentication failed: unknown user {}", username);
                Err(StorageError::Unauthorized)
            }
        }
    }

    pub fn upload(&self, caller: &AuthenticatedAccount, record_id: RecordId, payload: &[u8]) -> StorageResult<Feedback> {
        debug!("User {} uploading {} bytes to record {}", caller.username(), payload.len(), record_id);
        self.records.put(record_id, payload)
    }

    pub fn download(&self, caller: &AuthenticatedAccount, record_id: RecordId) -> StorageResult<Vec<u8>> {
        self.download_record(caller, record_id).map(|record| record.bytes)
    }

    /// Download the payload together with its metadata
    pub fn download_record(&self, caller: &AuthenticatedAccount, record_id: RecordId) -> StorageResult<StoredRecord> {
        debug!("User {} downloading record {}", caller.username(), record_id);
        self.records.get_record(record_id)
    }

    pub fn exists(&self, caller: &AuthenticatedAccount, record_id: RecordId) -> StorageResult<bool> {
        debug!("User {} probing record {}", caller.username(), record_id);
        self.records.exists(record_id)
    }

    pub fn stat(&self, caller: &AuthenticatedAccount, record_id: RecordId) -> StorageResult<RecordMetadata> {
        debug!("User {} reading metadata of record {}", caller.username(), record_id);
        self.records.metadata(record_id)
    }

    /// Create an account from a registration request
    pub fn register(&self, new_account: NewAccount) -> StorageResult<Account> {
        let account = new_account.into_account()?;
        self.accounts.create_account(&account)?;
        info!("Registered account {}", account.username);
        Ok(account)
    }

    /// Register every seed account whose username is still free.
    /// Returns how many accounts were created.
    pub fn seed_accounts(&self, seed: &[NewAccount]) -> StorageResult<usize> {
        let mut created = 0;
        for new_account in seed {
            if self.accounts.find_account(&new_account.username)?.is_some() {
                debug!("Seed account {} already exists, skipping", new_account.username);
                continue;
            }
            self.register(new_account.clone())?;
            created += 1;
        }
        Ok(created)
    }
}
