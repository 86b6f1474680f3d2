//! # Logging System
//!
//! Installs a `tracing` subscriber built from a [`LogConfig`]. Records
//! emitted through the `log` facade are captured as well, so the rest of the
//! crate logs with the usual `info!` / `warn!` / `error!` macros.

pub mod config;
pub mod outputs;

pub use config::LogConfig;

use once_cell::sync::OnceCell;
use outputs::{ConsoleOutput, FileOutput};
use std::sync::Mutex;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

/// A type-erased layer over the base registry
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Global logging configuration instance
static LOGGING_CONFIG: OnceCell<LogConfig> = OnceCell::new();

/// Keeps the non-blocking file writers alive for the process lifetime
static FILE_GUARDS: OnceCell<Mutex<Vec<WorkerGuard>>> = OnceCell::new();

/// Logging system entry point
pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize the logging system with a custom configuration
    pub fn init_with_config(config: LogConfig) -> Result<(), LoggingError> {
        if LOGGING_CONFIG.get().is_some() {
            return Err(LoggingError::AlreadyInitialized);
        }

        let level = parse_level(&config.level)?;
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guards = Vec::new();

        if config.console.enabled {
            layers.push(ConsoleOutput::new(&config.console).create_layer(level)?);
        }

        if config.file.enabled {
            let mut file_output = FileOutput::new(&config.file)?;
            layers.extend(file_output.create_layers(level)?);
            guards.extend(file_output.into_guards());
        }

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .map_err(|e| LoggingError::Config(format!("Failed to install subscriber: {}", e)))?;

        LOGGING_CONFIG
            .set(config)
            .map_err(|_| LoggingError::AlreadyInitialized)?;
        let _ = FILE_GUARDS.set(Mutex::new(guards));

        Ok(())
    }
}

/// Parse a level name as used in configuration files and `LOG_LEVEL`.
pub fn parse_level(level: &str) -> Result<Level, LoggingError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(LoggingError::Config(format!("Invalid log level: {}", level))),
    }
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}
