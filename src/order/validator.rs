//! Validation of order records and whole JSON payloads

use super::{OrderRecord, RawRow};
use log::debug;
use serde_json::Value;
use thiserror::Error;

pub(crate) const ORDER_ID_KEYS: &[&str] = &["orderId", "pwnOrderId"];
pub(crate) const EMAIL_KEYS: &[&str] = &["email"];

/// Why a single record was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing orderId")]
    MissingOrderId,

    #[error("missing email")]
    MissingEmail,
}

/// Why a whole JSON payload was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Payload must be a non-empty JSON array")]
    NotANonEmptyArray,

    #[error("Some records are missing required fields (orderId, email). Invalid count: {invalid}")]
    InvalidRecords { invalid: usize },
}

/// Reject records whose `orderId` or `email` is empty.
pub fn validate_record(record: &OrderRecord) -> Result<(), ValidationError> {
    if record.order_id.trim().is_empty() {
        return Err(ValidationError::MissingOrderId);
    }
    if record.email.trim().is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    Ok(())
}

/// Same rule as [`validate_record`], applied before normalization.
pub fn validate_row(row: &RawRow) -> Result<(), ValidationError> {
    if row.first_present(ORDER_ID_KEYS).is_none() {
        return Err(ValidationError::MissingOrderId);
    }
    if row.first_present(EMAIL_KEYS).is_none() {
        return Err(ValidationError::MissingEmail);
    }
    Ok(())
}

/// Validate a JSON payload as a whole.
///
/// The payload must be a non-empty array whose every element is an object
/// carrying both identifying fields. Either all rows come back, or none do.
pub fn validate_payload(payload: &Value) -> Result<Vec<RawRow>, PayloadError> {
    let items = match payload.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return Err(PayloadError::NotANonEmptyArray),
    };

    let mut rows = Vec::with_capacity(items.len());
    let mut invalid = 0;
    for (index, item) in items.iter().enumerate() {
        match RawRow::from_json(item) {
            Some(row) => match validate_row(&row) {
                Ok(()) => rows.push(row),
                Err(e) => {
                    debug!("Payload element {} rejected: {}", index, e);
                    invalid += 1;
                }
            },
            None => {
                debug!("Payload element {} is not an object", index);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        return Err(PayloadError::InvalidRecords { invalid });
    }
    Ok(rows)
}
