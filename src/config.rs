//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults and
//! environment overrides for the backend selection.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use log::{info, warn};

use crate::account::NewAccount;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "DDSS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Blob storage backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum StorageBackend {
    #[default]
    LocalFile,
    Mock,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "localfile" | "local" | "file" => Ok(StorageBackend::LocalFile),
            "mock" => Ok(StorageBackend::Mock),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

/// Metadata backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum MetadataBackend {
    #[default]
    SQLite,
    Mock,
}

impl std::str::FromStr for MetadataBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(MetadataBackend::SQLite),
            "mock" => Ok(MetadataBackend::Mock),
            _ => Err(format!("Unknown metadata backend: {}", s)),
        }
    }
}

/// Account backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum AccountBackend {
    #[default]
    SQLite,
    Mock,
}

impl std::str::FromStr for AccountBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(AccountBackend::SQLite),
            "mock" => Ok(AccountBackend::Mock),
            _ => Err(format!("Unknown account backend: {}", s)),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub metadata: MetadataConfig,
    pub accounts: AccountConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum upload size in bytes
    pub max_payload_size: usize,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Append-only data file holding every payload
    pub data_path: String,
}

/// Metadata backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub backend: MetadataBackend,
    pub db_path: String,
    pub wal_mode: bool,
}

/// Account backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub backend: AccountBackend,
    pub db_path: String,
    pub wal_mode: bool,
    /// Accounts created at startup when their username is not taken yet
    pub seed: Vec<NewAccount>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to the log4rs configuration file
    pub config_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9710,
            workers: 4,
            max_payload_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::LocalFile,
            data_path: "./data/records.bin".to_string(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            backend: MetadataBackend::SQLite,
            db_path: "./data/metadata.db".to_string(),
            wal_mode: true,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            backend: AccountBackend::SQLite,
            db_path: "./data/accounts.db".to_string(),
            wal_mode: true,
            seed: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$DDSS_CONFIG` or `config.yaml`, use defaults if not found
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file, use defaults if it does not exist
    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = config_path.as_ref();
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            warn!("Config file {} not found, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Replace backend choices with `STORAGE_BACKEND`, `METADATA_BACKEND`
    /// and `ACCOUNT_BACKEND` when they are set and valid
    pub fn apply_env_overrides(&mut self) {
        if let Some(backend) = backend_from_env("STORAGE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Some(backend) = backend_from_env("METADATA_BACKEND") {
            self.metadata.backend = backend;
        }
        if let Some(backend) = backend_from_env("ACCOUNT_BACKEND") {
            self.accounts.backend = backend;
        }
    }

    /// Configuration with every backend in memory
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.storage.backend = StorageBackend::Mock;
        config.metadata.backend = MetadataBackend::Mock;
        config.accounts.backend = AccountBackend::Mock;
        config
    }
}

fn backend_from_env<T>(var: &str) -> Option<T>
where
    T: std::str::FromStr<Err = String> + std::fmt::Debug,
{
    let value = env::var(var).ok()?;
    match value.parse::<T>() {
        Ok(backend) => {
            info!("Using {} from environment: {:?}", var, backend);
            Some(backend)
        }
        Err(e) => {
            warn!("Invalid {} in environment: {}. Keeping configured backend.", var, e);
            None
        }
    }
}
