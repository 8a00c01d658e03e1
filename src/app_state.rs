//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use std::sync::Arc;
use actix_web::web;
use log::info;

use crate::account::{AccountStorage, NewAccount, mock_store::MockAccountStore, sqlite_store::SQLiteAccountStore};
use crate::config::{AccountBackend, AppConfig, MetadataBackend, StorageBackend};
use crate::error::StorageResult;
use crate::metadata::{MetadataStorage, mock_store::MockMetadataStore, sqlite_store::SQLiteMetadataStore};
use crate::service::{AccessGateway, RecordService};
use crate::storage::{BlobStorage, local_store::LocalFileBlobStore, mock_store::MockBlobStore};

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AccessGateway>,
    pub records: Arc<RecordService>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration and register seed accounts
    pub fn from_config(config: AppConfig) -> StorageResult<Self> {
        info!("Initializing application state with configuration");

        let blobs: Arc<dyn BlobStorage> = match config.storage.backend {
            StorageBackend::LocalFile => {
                info!("Using local file blob backend with data_path: {}", config.storage.data_path);
                Arc::new(LocalFileBlobStore::new(&config.storage)?)
            }
            StorageBackend::Mock => {
                info!("Using mock blob backend");
                Arc::new(MockBlobStore::new())
            }
        };

        let metadata: Arc<dyn MetadataStorage> = match config.metadata.backend {
            MetadataBackend::SQLite => {
                info!("Using SQLite metadata backend with db_path: {}, wal_mode: {}",
                      config.metadata.db_path, config.metadata.wal_mode);
                Arc::new(SQLiteMetadataStore::new(&config.metadata)?)
            }
            MetadataBackend::Mock => {
                info!("Using mock metadata backend");
                Arc::new(MockMetadataStore::new())
            }
        };

        let accounts: Arc<dyn AccountStorage> = match config.accounts.backend {
            AccountBackend::SQLite => {
                info!("Using SQLite account backend with db_path: {}", config.accounts.db_path);
                Arc::new(SQLiteAccountStore::new(&config.accounts)?)
            }
            AccountBackend::Mock => {
                info!("Using mock account backend");
                Arc::new(MockAccountStore::new())
            }
        };

        let state = Self::from_backends(blobs, metadata, accounts, config);

        let created = state.gateway.seed_accounts(&state.config.accounts.seed)?;
        info!("Application state initialized ({} seed accounts created)", created);
        Ok(state)
    }

    /// Wire services over already constructed backends
    pub fn from_backends(
        blobs: Arc<dyn BlobStorage>,
        metadata: Arc<dyn MetadataStorage>,
        accounts: Arc<dyn AccountStorage>,
        config: AppConfig,
    ) -> Self {
        let records = Arc::new(RecordService::new(blobs, metadata));
        let gateway = Arc::new(AccessGateway::new(accounts, records.clone()));
        Self { gateway, records, config }
    }

    /// Create application state for testing with mock backends and the given accounts
    pub fn new_for_testing(accounts: &[NewAccount]) -> StorageResult<Self> {
        let mut config = AppConfig::for_testing();
        config.accounts.seed = accounts.to_vec();
        Self::from_config(config)
    }
}

/// Helper function to extract app state from Actix-web data
pub fn extract_app_state(data: &web::Data<AppState>) -> &AppState {
    data.as_ref()
}
