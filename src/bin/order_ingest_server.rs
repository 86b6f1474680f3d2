use clap::Parser;
use log::{error, info};
use order_ingest::config::ServerConfig;
use order_ingest::logging::LoggingSystem;
use order_ingest::{AppResult, OrderIngestServer, OrderIngestionService, OrderStore, SledOrderStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Command line options for the ingestion server binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Port for the HTTP server (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// TOML configuration file (overrides ORDER_INGEST_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Document store location (overrides DATABASE_PATH)
    #[arg(long)]
    database_path: Option<PathBuf>,
}

impl Cli {
    /// Resolve defaults, config file, environment, then flags.
    fn resolve_config(self) -> AppResult<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = ServerConfig::from_file(path)?;
                config.apply_env_with(|key| std::env::var(key).ok())?;
                config
            }
            None => ServerConfig::from_env()?,
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(path) = self.database_path {
            config.database_path = path;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Main entry point for the order ingestion server.
///
/// Opens the document store before binding; a store that cannot be opened
/// aborts startup. The store is flushed once the server stops.
#[tokio::main]
async fn main() -> AppResult<()> {
    let config = Cli::parse().resolve_config()?;
    LoggingSystem::init_with_config(config.log_config())?;
    info!(
        "Starting order ingest server ({} environment)",
        config.environment
    );

    let store = match SledOrderStore::open(&config.database_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(
                "Failed to open order store at {}: {}",
                config.database_path.display(),
                e
            );
            return Err(e.into());
        }
    };

    let service = OrderIngestionService::new(store.clone(), &config)?;
    let server = OrderIngestServer::new(config, service);
    let result = server.run().await;

    store.flush()?;
    info!("Order store flushed");
    result
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["test"]);
        assert_eq!(cli.port, None);
        assert!(cli.config.is_none());
    }

    #[test]
    fn custom_port() {
        let cli = Cli::parse_from(["test", "--port", "8000"]);
        assert_eq!(cli.port, Some(8000));
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["test", "--port", "8100", "--host", "0.0.0.0"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.port, 8100);
        assert_eq!(config.bind_address(), "0.0.0.0:8100");
    }
}
