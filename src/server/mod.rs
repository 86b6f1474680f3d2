//! HTTP surface of the ingestion service
//!
//! * `routes` - Flat route table and handlers
//! * `auth` - Optional bearer-token check on the upload routes
//! * `http_server` - actix-web server wiring

pub mod auth;
pub mod http_server;
pub mod routes;

pub use http_server::{BoundServer, OrderIngestServer};

use crate::config::ServerConfig;
use crate::ingestion::OrderIngestionService;
use actix_web::HttpRequest;
use std::sync::Arc;

/// Shared application state for the HTTP server.
pub struct AppState {
    pub service: Arc<OrderIngestionService>,
    pub config: Arc<ServerConfig>,
}

/// Address used to tag log lines: first `X-Forwarded-For` entry, else the peer.
pub fn client_ip(req: &HttpRequest) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
