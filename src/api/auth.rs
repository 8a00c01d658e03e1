// HTTP Basic authentication
use actix_web::http::header;
use actix_web::HttpRequest;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::warn;

use crate::error::{StorageError, StorageResult};

/// Username and secret carried by a Basic `Authorization` header
#[derive(Debug, Clone, PartialEq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse a Basic `Authorization` header value
pub fn parse_basic_authorization(auth_header: &str) -> StorageResult<BasicCredentials> {
    // Format: "Basic base64(username:password)", scheme is case-insensitive
    let (scheme, encoded) = auth_header
        .trim()
        .split_once(' ')
        .ok_or(StorageError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        warn!("Unsupported authorization scheme: {}", scheme);
        return Err(StorageError::Unauthorized);
    }

    let decoded = STANDARD.decode(encoded.trim()).map_err(|_| {
        warn!("Basic credentials are not valid base64");
        StorageError::Unauthorized
    })?;
    let decoded = String::from_utf8(decoded).map_err(|_| {
        warn!("Basic credentials are not valid UTF-8");
        StorageError::Unauthorized
    })?;

    // the password may itself contain ':'
    let (username, password) = decoded.split_once(':').ok_or(StorageError::Unauthorized)?;
    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Extract Basic credentials from a request
pub fn credentials_from_request(req: &HttpRequest) -> StorageResult<BasicCredentials> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            warn!("Missing Authorization header");
            StorageError::Unauthorized
        })?
        .to_str()
        .map_err(|_| {
            warn!("Invalid Authorization header format");
            StorageError::Unauthorized
        })?;

    parse_basic_authorization(auth_header)
}

/// Build a Basic `Authorization` header value
pub fn basic_authorization_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}
