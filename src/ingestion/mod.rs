//! # Ingestion Module
//!
//! Turns uploaded order data into persisted documents.
//!
//! ## Components
//!
//! * `csv_reader` - Streaming CSV parser producing raw rows in source order
//! * `upload` - Temporary upload file removed exactly once
//! * `batch` - Fixed-size batch inserter with per-batch failure isolation
//! * `service` - Orchestrates normalize, validate, insert and forward
//! * `error` - Custom error types for ingestion operations
//!
//! ## Architecture
//!
//! The ingestion process follows these steps:
//! 1. Read rows from the uploaded CSV file or the JSON array
//! 2. Normalize each row into an `OrderRecord`
//! 3. Drop rows missing `orderId` or `email` (the JSON path rejects the whole payload)
//! 4. Insert the remaining records batch by batch
//! 5. Forward persisted records when an outbound API is configured
//! 6. Delete the temporary upload

pub mod batch;
pub mod csv_reader;
pub mod error;
pub mod service;
pub mod upload;

// Public re-exports
pub use batch::{BatchInserter, BatchReport};
pub use csv_reader::{CsvEncoding, CsvOrderReader};
pub use error::{IngestionError, IngestionResult};
pub use service::OrderIngestionService;
pub use upload::ScopedUpload;

use serde::{Deserialize, Serialize};

/// Response body of a completed ingestion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResponse {
    /// `success`, or `error` when forwarding reported failures
    pub status: String,
    pub message: String,
    /// Rows read from the source
    pub total_rows: usize,
    /// Rows that passed validation
    pub valid_rows: usize,
    /// Rows dropped for missing required fields
    pub skipped_rows: usize,
    /// Documents written to the store
    pub inserted: usize,
    /// Batches attempted
    pub batches: usize,
    /// Records accepted by the external API, when forwarding ran
    pub forwarded: Option<usize>,
    /// Batch, record and forwarding failures
    pub errors: Vec<String>,
}

impl IngestionResponse {
    /// Create a successful ingestion response
    pub fn success(total_rows: usize, valid_rows: usize, report: &BatchReport) -> Self {
        Self {
            status: "success".to_string(),
            message: format!("{} records inserted successfully", report.inserted),
            total_rows,
            valid_rows,
            skipped_rows: total_rows.saturating_sub(valid_rows),
            inserted: report.inserted,
            batches: report.batches_attempted,
            forwarded: None,
            errors: report.error_messages(),
        }
    }

    /// Add an error to the response
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
        self.status = "error".to_string();
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Response body of a failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn from_error(error: &IngestionError) -> Self {
        let details = error.to_string();
        Self {
            status: "error".to_string(),
            message: error.summary().to_string(),
            details: (details != error.summary()).then_some(details),
            invalid_count: error.invalid_count(),
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests;
