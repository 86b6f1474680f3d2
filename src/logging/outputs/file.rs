//! File output handler.
//!
//! Records are split by severity: ERROR goes to the error file, everything
//! else at or above the configured threshold goes to the success file.

use crate::logging::config::FileConfig;
use crate::logging::{BoxedLayer, LoggingError};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt;
use tracing_subscriber::Layer;

/// File output handler that owns the background writer guards
pub struct FileOutput {
    config: FileConfig,
    guards: Vec<WorkerGuard>,
}

impl FileOutput {
    /// Create a new file output handler, creating the log directory if needed
    pub fn new(config: &FileConfig) -> Result<Self, LoggingError> {
        std::fs::create_dir_all(&config.directory)?;
        Ok(Self {
            config: config.clone(),
            guards: Vec::new(),
        })
    }

    /// Create the success and error layers
    pub fn create_layers(&mut self, level: Level) -> Result<Vec<BoxedLayer>, LoggingError> {
        let success = self.open_appender(&self.config.success_file)?;
        let (success_writer, success_guard) = tracing_appender::non_blocking(success);
        let success_layer = fmt::layer()
            .with_writer(success_writer)
            .with_ansi(false)
            .with_filter(filter_fn(move |meta| {
                *meta.level() != Level::ERROR && *meta.level() <= level
            }));

        let errors = self.open_appender(&self.config.error_file)?;
        let (error_writer, error_guard) = tracing_appender::non_blocking(errors);
        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_filter(filter_fn(|meta| *meta.level() == Level::ERROR));

        self.guards.push(success_guard);
        self.guards.push(error_guard);

        Ok(vec![success_layer.boxed(), error_layer.boxed()])
    }

    /// Hand over the writer guards; dropping them stops the background writers.
    pub fn into_guards(self) -> Vec<WorkerGuard> {
        self.guards
    }

    fn open_appender(&self, file_name: &str) -> Result<RollingFileAppender, LoggingError> {
        let rotation = if self.config.rotate_daily {
            Rotation::DAILY
        } else {
            Rotation::NEVER
        };
        RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(file_name)
            .build(Path::new(&self.config.directory))
            .map_err(|e| LoggingError::Config(format!("Failed to open {}: {}", file_name, e)))
    }
}
