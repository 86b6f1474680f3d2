use super::{routes, AppState};
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::ingestion::OrderIngestionService;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;

/// HTTP server for the order ingestion service.
///
/// Holds the resolved configuration and the shared ingestion service; every
/// worker gets a clone of the same [`AppState`].
pub struct OrderIngestServer {
    config: Arc<ServerConfig>,
    service: Arc<OrderIngestionService>,
}

/// A server bound to its listeners but not yet awaited.
pub struct BoundServer {
    pub server: Server,
    pub local_addrs: Vec<SocketAddr>,
}

impl OrderIngestServer {
    pub fn new(config: ServerConfig, service: OrderIngestionService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }

    pub fn bind_address(&self) -> String {
        self.config.bind_address()
    }

    /// Bind the listener and start accepting connections.
    ///
    /// The returned [`Server`] must be awaited (or spawned) to drive it.
    pub fn start(&self) -> AppResult<BoundServer> {
        let app_state = web::Data::new(AppState {
            service: self.service.clone(),
            config: self.config.clone(),
        });
        let max_json_bytes = self.config.max_json_bytes;

        let http_server = HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(app_state.clone())
                .app_data(web::PayloadConfig::new(max_json_bytes))
                .configure(routes::configure)
        })
        .bind(self.bind_address())
        .map_err(|e| AppError::Server(format!("Failed to bind HTTP server: {}", e)))?;

        let local_addrs = http_server.addrs();
        Ok(BoundServer {
            server: http_server.run(),
            local_addrs,
        })
    }

    /// Run until the server is stopped (Ctrl-C or SIGTERM).
    pub async fn run(&self) -> AppResult<()> {
        let bound = self.start()?;
        for addr in &bound.local_addrs {
            info!("HTTP server running on {}", addr);
        }

        bound
            .server
            .await
            .map_err(|e| AppError::Server(format!("HTTP server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
