//! Error type shared by the storage layers, the access gateway and the HTTP API.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::metadata::RecordId;

/// Realm announced in the `WWW-Authenticate` challenge
pub const AUTH_REALM: &str = "ddss-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    /// Credentials missing, malformed, or not matching any account
    #[error("unauthorized")]
    Unauthorized,

    #[error("no record stored under id {0}")]
    NotFound(RecordId),

    #[error("account already exists: {0}")]
    AccountExists(String),

    /// Stored bytes no longer match the checksum recorded at upload time
    #[error("record {0} failed checksum verification")]
    Corrupted(RecordId),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(format!("sqlite: {}", e))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Backend(format!("io: {}", e))
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(e: tokio::task::JoinError) -> Self {
        StorageError::Backend(format!("blocking task: {}", e))
    }
}

impl ResponseError for StorageError {
    fn status_code(&self) -> StatusCode {
        match self {
            StorageError::Unauthorized => StatusCode::UNAUTHORIZED,
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::AccountExists(_) => StatusCode::CONFLICT,
            StorageError::Corrupted(_) | StorageError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            StorageError::Unauthorized => HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", AUTH_REALM)))
                .json(serde_json::json!({ "error": "unauthorized" })),
            StorageError::NotFound(_) => HttpResponse::NotFound().finish(),
            StorageError::AccountExists(username) => HttpResponse::Conflict()
                .json(serde_json::json!({ "error": "account already exists", "username": username })),
            StorageError::Corrupted(_) | StorageError::Backend(_) => {
                error!("{}", self);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "internal storage error" }))
            }
        }
    }
}
