//! Error types for the ingestion module

use super::csv_reader::CsvReadError;
use crate::order::PayloadError;
use actix_web::http::StatusCode;
use thiserror::Error;

/// Errors that end an ingestion request
#[derive(Error, Debug)]
pub enum IngestionError {
    /// The multipart body carried no `file` field
    #[error("No file uploaded")]
    NoFile,

    /// Malformed multipart body
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Request body is not valid JSON
    #[error("Invalid JSON body: {0}")]
    MalformedJson(String),

    /// JSON payload rejected as a whole
    #[error("{0}")]
    InvalidPayload(#[from] PayloadError),

    /// CSV stream aborted
    #[error("Error parsing CSV file: {0}")]
    CsvParse(#[from] CsvReadError),

    /// Nothing could be persisted
    #[error("Error saving data to DB: {0}")]
    Store(String),

    /// Missing or wrong bearer token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (forwarding client setup, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A blocking file or store task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl IngestionError {
    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// HTTP status the endpoint answers with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoFile
            | Self::InvalidUpload(_)
            | Self::MalformedJson(_)
            | Self::InvalidPayload(_)
            | Self::CsvParse(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::Io(_) | Self::Configuration(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short message for the response body; the error text goes in `details`.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::NoFile => "No file uploaded",
            Self::InvalidUpload(_) => "Invalid upload",
            Self::MalformedJson(_) => "Invalid JSON body",
            Self::InvalidPayload(PayloadError::NotANonEmptyArray) => {
                "Payload must be a non-empty JSON array"
            }
            Self::InvalidPayload(PayloadError::InvalidRecords { .. }) => {
                "Some records are missing required fields (orderId, email)"
            }
            Self::CsvParse(_) => "Error parsing CSV file",
            Self::Store(_) => "Error saving data to DB",
            Self::Unauthorized => "Unauthorized",
            Self::Io(_) | Self::Task(_) => "Internal server error",
            Self::Configuration(_) => "Service misconfigured",
        }
    }

    /// Count of rejected records, for payload validation failures.
    pub fn invalid_count(&self) -> Option<usize> {
        match self {
            Self::InvalidPayload(PayloadError::InvalidRecords { invalid }) => Some(*invalid),
            _ => None,
        }
    }
}

/// Result type for ingestion operations
pub type IngestionResult<T> = std::result::Result<T, IngestionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(IngestionError::NoFile.status_code(), StatusCode::BAD_REQUEST);
        let err = IngestionError::from(PayloadError::InvalidRecords { invalid: 2 });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.invalid_count(), Some(2));
        assert!(err.to_string().contains("Invalid count: 2"));
    }

    #[test]
    fn store_failures_map_to_internal_error() {
        let err = IngestionError::store("batch 1 failed");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.summary(), "Error saving data to DB");
        assert_eq!(err.invalid_count(), None);
    }

    #[test]
    fn background_task_failure_is_an_internal_error() {
        let err = IngestionError::Task("task panicked".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.summary(), "Internal server error");
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(
            IngestionError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
