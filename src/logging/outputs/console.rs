//! Console output handler with color support

use crate::logging::config::ConsoleConfig;
use crate::logging::{BoxedLayer, LoggingError};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::Layer;
use std::io;

/// Console output handler that writes human-readable lines to stdout
pub struct ConsoleOutput {
    config: ConsoleConfig,
}

impl ConsoleOutput {
    /// Create a new console output handler
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Create a tracing layer for console output
    pub fn create_layer(&self, level: Level) -> Result<BoxedLayer, LoggingError> {
        let layer = fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(self.config.colors)
            .with_target(self.config.include_module)
            .with_filter(LevelFilter::from_level(level));

        Ok(layer.boxed())
    }
}
