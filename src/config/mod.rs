//! Server configuration
//!
//! [`ServerConfig`] is resolved once at startup, in this order: built-in
//! defaults, an optional TOML file, environment variables, then command-line
//! flags applied by the binary. Components receive the resolved values and
//! never read the environment themselves.

use crate::ingestion::csv_reader::CsvEncoding;
use crate::logging::{self, LogConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_FILE_ENV: &str = "ORDER_INGEST_CONFIG";

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_JSON_BYTES: usize = 10 * 1024 * 1024;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Outbound forwarding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Endpoint receiving one POST per record; forwarding is off when unset
    pub url: Option<String>,
    /// Bearer token sent with every forwarded record
    pub api_key: Option<String>,
    /// Timeout for each outbound call in seconds
    pub timeout_seconds: u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_seconds: 30,
        }
    }
}

impl ForwardConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

/// Configuration for the ingestion server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path of the document store
    pub database_path: PathBuf,
    /// Interface to bind
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Deployment environment; production also logs to files
    pub environment: Environment,
    /// Log threshold level
    pub log_level: String,
    /// Directory for production log files
    pub log_dir: PathBuf,
    /// Text encoding of uploaded CSV files
    pub csv_encoding: CsvEncoding,
    /// Directory receiving uploads while they are processed
    pub upload_dir: PathBuf,
    /// Records per insert batch
    pub batch_size: usize,
    /// Largest accepted JSON body in bytes
    pub max_json_bytes: usize,
    /// Bearer token required on upload routes when set
    pub api_token: Option<String>,
    /// Outbound forwarding
    pub forward: ForwardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/orders"),
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: Environment::Development,
            log_level: "INFO".to_string(),
            log_dir: PathBuf::from("logs"),
            csv_encoding: CsvEncoding::Utf8,
            upload_dir: PathBuf::from("uploads"),
            batch_size: DEFAULT_BATCH_SIZE,
            max_json_bytes: DEFAULT_MAX_JSON_BYTES,
            api_token: None,
            forward: ForwardConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Resolve configuration from the optional config file and the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = match env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env_with(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a variable lookup such as `std::env::var`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = var("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = parse_var("PORT", &port)?;
        }
        if let Some(environment) = var("APP_ENV") {
            self.environment = parse_var("APP_ENV", &environment)?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(dir) = var("LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(encoding) = var("CSV_ENCODING") {
            self.csv_encoding = parse_var("CSV_ENCODING", &encoding)?;
        }
        if let Some(dir) = var("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(size) = var("BATCH_SIZE") {
            self.batch_size = parse_var("BATCH_SIZE", &size)?;
        }
        if let Some(bytes) = var("MAX_JSON_BYTES") {
            self.max_json_bytes = parse_var("MAX_JSON_BYTES", &bytes)?;
        }
        if let Some(token) = var("API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(url) = var("FORWARD_API_URL") {
            self.forward.url = Some(url);
        }
        if let Some(key) = var("FORWARD_API_KEY") {
            self.forward.api_key = Some(key);
        }
        if let Some(timeout) = var("FORWARD_TIMEOUT_SECONDS") {
            self.forward.timeout_seconds = parse_var("FORWARD_TIMEOUT_SECONDS", &timeout)?;
        }

        Ok(())
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(validation("port", "Port must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(validation("batch_size", "Batch size must be greater than 0"));
        }
        if self.max_json_bytes == 0 {
            return Err(validation("max_json_bytes", "JSON body limit must be greater than 0"));
        }
        if let Err(e) = logging::parse_level(&self.log_level) {
            return Err(validation("log_level", &e.to_string()));
        }
        if self.forward.is_enabled() {
            if self.forward.timeout_seconds == 0 {
                return Err(validation("forward.timeout_seconds", "Timeout must be greater than 0"));
            }
            if self.forward.timeout_seconds > 300 {
                return Err(validation(
                    "forward.timeout_seconds",
                    "Timeout should not exceed 300 seconds",
                ));
            }
        }
        Ok(())
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Logging setup for this deployment.
    pub fn log_config(&self) -> LogConfig {
        match self.environment {
            Environment::Production => LogConfig::with_files(&self.log_level, &self.log_dir),
            Environment::Development => LogConfig::console(&self.log_level),
        }
    }

    /// Whether upload routes require a bearer token.
    pub fn requires_token(&self) -> bool {
        self.api_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn validation(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}
