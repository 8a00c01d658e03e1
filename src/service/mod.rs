//! Service layer: the record store and the gateway that guards it.

pub mod access_gateway;
pub mod record_service;

pub use access_gateway::{AccessGateway, AuthenticatedAccount};
pub use record_service::{Feedback, RecordService, StoredRecord};
