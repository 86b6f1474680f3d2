use crate::config::ConfigError;
use crate::ingestion::IngestionError;
use crate::logging::LoggingError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that stop the server from starting or running.
///
/// Request-level failures never surface here; they are answered with an
/// HTTP status by the route handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ingestion setup error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for startup operations
pub type AppResult<T> = Result<T, AppError>;
