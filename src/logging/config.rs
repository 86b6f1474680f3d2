//! Configuration for the logging system
//!
//! A [`LogConfig`] is derived from the server configuration once at startup.
//! Development deployments log to the console only; production deployments
//! additionally write `success.log` and `error.log` under the log directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main logging configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Threshold level: TRACE, DEBUG, INFO, WARN or ERROR
    pub level: String,
    /// Console output configuration
    pub console: ConsoleConfig,
    /// File output configuration
    pub file: FileConfig,
}

/// Console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Enable console output
    pub enabled: bool,
    /// Enable colors in console output
    pub colors: bool,
    /// Include module path
    pub include_module: bool,
}

/// File output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Enable file output
    pub enabled: bool,
    /// Directory holding the log files
    pub directory: PathBuf,
    /// Receives every record below ERROR
    pub success_file: String,
    /// Receives ERROR records
    pub error_file: String,
    /// Rotate files daily instead of appending forever
    pub rotate_daily: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colors: true,
            include_module: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("logs"),
            success_file: "success.log".to_string(),
            error_file: "error.log".to_string(),
            rotate_daily: false,
        }
    }
}

impl LogConfig {
    /// Console-only logging at `level`.
    pub fn console(level: &str) -> Self {
        Self {
            level: level.to_string(),
            ..Default::default()
        }
    }

    /// Console plus `success.log` / `error.log` files under `directory`.
    pub fn with_files(level: &str, directory: impl Into<PathBuf>) -> Self {
        Self {
            level: level.to_string(),
            console: ConsoleConfig {
                colors: false,
                ..Default::default()
            },
            file: FileConfig {
                enabled: true,
                directory: directory.into(),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_config_has_no_file_output() {
        let config = LogConfig::console("DEBUG");
        assert_eq!(config.level, "DEBUG");
        assert!(config.console.enabled);
        assert!(!config.file.enabled);
    }

    #[test]
    fn file_config_points_at_directory() {
        let config = LogConfig::with_files("INFO", "/var/log/orders");
        assert!(config.file.enabled);
        assert_eq!(config.file.directory, PathBuf::from("/var/log/orders"));
        assert_eq!(config.file.error_file, "error.log");
        assert!(!config.console.colors);
    }
}
