//! HTTP route handlers for the ingestion API

use super::auth::authorize;
use super::{client_ip, AppState};
use crate::ingestion::{
    ErrorResponse, IngestionError, IngestionResponse, IngestionResult, ScopedUpload,
};
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::TryStreamExt;
use log::{error, info, warn};
use serde_json::Value;
use std::path::Path;

/// Multipart field carrying the CSV file
const FILE_FIELD: &str = "file";

/// Register the route table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health))
        .route("/upload-csv", web::post().to(upload_csv))
        .route("/upload-json", web::post().to(upload_json));
}

/// Liveness check
pub async fn health(req: HttpRequest) -> impl Responder {
    info!("[{}] GET /", client_ip(&req));
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Server running")
}

/// Ingest an uploaded CSV file
pub async fn upload_csv(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
) -> HttpResponse {
    let ip = client_ip(&req);
    info!("[{}] Received CSV upload request", ip);

    if let Err(e) = authorize(&req, &state.config) {
        return error_response(&e, &ip);
    }

    let upload = match receive_upload(payload, &state.config.upload_dir).await {
        Ok(upload) => upload,
        Err(e) => return error_response(&e, &ip),
    };

    respond(state.service.ingest_csv_upload(upload, &ip).await, &ip)
}

/// Ingest a JSON array of orders
pub async fn upload_json(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let ip = client_ip(&req);
    info!("[{}] Received JSON upload request ({} bytes)", ip, body.len());

    if let Err(e) = authorize(&req, &state.config) {
        return error_response(&e, &ip);
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return error_response(&IngestionError::MalformedJson(e.to_string()), &ip),
    };

    respond(state.service.ingest_json(&payload, &ip).await, &ip)
}

/// Stream the `file` field into a scoped upload; other fields are drained.
async fn receive_upload(mut payload: Multipart, upload_dir: &Path) -> IngestionResult<ScopedUpload> {
    let mut upload: Option<ScopedUpload> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| IngestionError::InvalidUpload(e.to_string()))?
    {
        let disposition = field.content_disposition();
        let is_file = disposition.get_name() == Some(FILE_FIELD) && upload.is_none();
        let filename = disposition.get_filename().map(str::to_string);

        if !is_file {
            while field
                .try_next()
                .await
                .map_err(|e| IngestionError::InvalidUpload(e.to_string()))?
                .is_some()
            {}
            continue;
        }

        let mut target = ScopedUpload::create_in(upload_dir)?.with_original_name(filename);
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| IngestionError::InvalidUpload(e.to_string()))?
        {
            target.write_chunk(&chunk)?;
        }
        target.finish()?;
        upload = Some(target);
    }

    upload.ok_or(IngestionError::NoFile)
}

fn respond(result: IngestionResult<IngestionResponse>, ip: &str) -> HttpResponse {
    match result {
        Ok(response) if response.is_success() => HttpResponse::Ok().json(response),
        Ok(response) => {
            warn!("[{}] Forwarding reported {} failures", ip, response.errors.len());
            HttpResponse::BadGateway().json(response)
        }
        Err(e) => error_response(&e, ip),
    }
}

fn error_response(e: &IngestionError, ip: &str) -> HttpResponse {
    let status = e.status_code();
    if status.is_server_error() {
        error!("[{}] Request failed: {}", ip, e);
    } else {
        warn!("[{}] Request rejected: {}", ip, e);
    }
    HttpResponse::build(status).json(ErrorResponse::from_error(e))
}
