//! Canonical order record and the conversions that produce it.
//!
//! * `raw` - untyped key/value rows read from CSV cells or JSON objects
//! * `normalizer` - lenient conversion of raw rows into [`OrderRecord`]
//! * `validator` - record and payload validation

pub mod normalizer;
pub mod raw;
pub mod validator;

pub use normalizer::normalize;
pub use raw::RawRow;
pub use validator::{validate_payload, validate_record, PayloadError, ValidationError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single normalized order.
///
/// Only `order_id` and `email` are required; every other field is optional
/// and is stored as `null` when the source value was absent or unparseable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Externally assigned order identifier
    pub order_id: String,
    pub email: String,
    pub status: Option<String>,
    pub confirmation_code: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Free-text address, decomposed only when forwarding
    pub address: Option<String>,
    pub visit_type: Option<String>,
    /// Semicolon-delimited list, stored verbatim
    pub test_types: Option<String>,
    pub reason_for_testing: Option<String>,
    pub link: Option<String>,
    pub physician_name: Option<String>,
    pub external_id: Option<String>,
    pub provider_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub state: Option<String>,
    pub account_number: Option<String>,
    pub home_phone: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub zip: Option<String>,
    pub gender: Option<String>,
}

impl OrderRecord {
    /// Create a record carrying only the two identifying fields.
    pub fn new(order_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Split `test_types` on `;`, trimming entries and dropping empty ones.
    pub fn test_type_list(&self) -> Vec<String> {
        self.test_types
            .as_deref()
            .map(|types| {
                types
                    .split(';')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
