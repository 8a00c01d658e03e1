//! HTTP endpoints for uploading and downloading catalog records.

pub mod auth;

use actix_web::body::SizedStream;
use actix_web::http::header::{self, EntityTag, HttpDate};
use actix_web::{get, post, route, web, Error, HttpRequest, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use log::{debug, info, warn};
use std::time::SystemTime;

use crate::app_state::{extract_app_state, AppState};
use crate::error::{StorageError, StorageResult};
use crate::metadata::{RecordId, RecordMetadata};
use crate::service::AuthenticatedAccount;
use self::auth::credentials_from_request;

pub const UPLOAD_PATH: &str = "/storage/upload";
pub const DOWNLOAD_PATH: &str = "/storage/download";

/// Register the storage endpoints
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload).service(download).service(probe);
}

/// Run a blocking store call on the blocking pool with the log context set.
/// The context lives only on the blocking thread and is cleared afterwards.
async fn run_blocking<F, T>(user: &str, record_id: RecordId, f: F) -> StorageResult<T>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let user = user.to_string();
    tokio::task::spawn_blocking(move || {
        log_mdc::insert("user", user);
        log_mdc::insert("record_id", record_id.to_string());
        let result = f();
        log_mdc::clear();
        result
    })
    .await?
}

async fn authenticate(req: &HttpRequest, state: &AppState) -> StorageResult<AuthenticatedAccount> {
    let credentials = credentials_from_request(req)?;
    let gateway = state.gateway.clone();
    tokio::task::spawn_blocking(move || {
        log_mdc::insert("user", credentials.username.as_str());
        let result = gateway.authenticate(&credentials.username, &credentials.password);
        log_mdc::clear();
        result
    })
    .await?
}

async fn read_payload(mut payload: web::Payload, limit: usize) -> Result<BytesMut, Error> {
    let mut bytes = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > limit {
            warn!("Upload exceeds the {} byte limit", limit);
            return Err(actix_web::error::ErrorPayloadTooLarge("Payload too large"));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn etag(metadata_checksum: &str) -> header::ETag {
    header::ETag(EntityTag::new_strong(metadata_checksum.to_string()))
}

fn last_modified(metadata: &RecordMetadata) -> header::LastModified {
    header::LastModified(HttpDate::from(SystemTime::from(metadata.updated_at)))
}

/// Store the request body under `{id}` and echo it back
#[post("/storage/upload/{id}")]
pub async fn upload(
    path: web::Path<RecordId>,
    payload: web::Payload,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let record_id = path.into_inner();
    let state = extract_app_state(&app_state);

    let caller = authenticate(&req, state).await?;

    let bytes = read_payload(payload, state.config.server.max_payload_size).await?;
    debug!("Received {} bytes for record {}", bytes.len(), record_id);

    let gateway = state.gateway.clone();
    let user = caller.username().to_string();
    let feedback = run_blocking(&user, record_id, move || gateway.upload(&caller, record_id, &bytes)).await?;

    info!("User {} uploaded record {} ({} bytes)", user, record_id, feedback.bytes.len());
    Ok(HttpResponse::Created()
        .content_type("application/octet-stream")
        .insert_header(etag(&feedback.etag))
        .body(feedback.bytes))
}

/// Return the payload stored under `{id}`
#[get("/storage/download/{id}")]
pub async fn download(
    path: web::Path<RecordId>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let record_id = path.into_inner();
    let state = extract_app_state(&app_state);

    let caller = authenticate(&req, state).await?;

    let gateway = state.gateway.clone();
    let user = caller.username().to_string();
    let record = match run_blocking(&user, record_id, move || gateway.download_record(&caller, record_id)).await {
        Ok(record) => record,
        Err(StorageError::NotFound(id)) => {
            info!("User {} requested missing record {}", user, id);
            return Err(StorageError::NotFound(id).into());
        }
        Err(e) => return Err(e.into()),
    };

    debug!("Sending record {} ({} bytes)", record_id, record.bytes.len());
    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(etag(&record.metadata.checksum))
        .insert_header(last_modified(&record.metadata))
        .body(record.bytes))
}

/// Existence probe: headers of a download without the body
#[route("/storage/download/{id}", method = "HEAD")]
pub async fn probe(
    path: web::Path<RecordId>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let record_id = path.into_inner();
    let state = extract_app_state(&app_state);

    let caller = authenticate(&req, state).await?;

    let gateway = state.gateway.clone();
    let user = caller.username().to_string();
    let metadata = run_blocking(&user, record_id, move || gateway.stat(&caller, record_id)).await?;

    // HEAD responses carry no body, but the declared size becomes Content-Length
    let body = SizedStream::new(metadata.size(), futures::stream::empty::<Result<Bytes, std::io::Error>>());
    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(etag(&metadata.checksum))
        .insert_header(last_modified(&metadata))
        .body(body))
}
