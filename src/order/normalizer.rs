//! Lenient conversion of raw rows into canonical order records.
//!
//! Nothing in here fails: unparseable dates and numbers become `None`, and
//! blank cells are treated as absent. Source systems that prefix their
//! column names (`pwnOrderId`, `pwnCreatedAt`, ...) are accepted through
//! aliases; the canonical name wins when both are present.

use super::{OrderRecord, RawRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const ORDER_ID: &[&str] = &["orderId", "pwnOrderId"];
const STATUS: &[&str] = &["status", "pwnOrderStatus"];
const CREATED_AT: &[&str] = &["createdAt", "pwnCreatedAt"];
const EXPIRES_AT: &[&str] = &["expiresAt", "pwnExpiresAt"];
const LINK: &[&str] = &["link", "pwnLink"];
const PHYSICIAN_NAME: &[&str] = &["physicianName", "pwnPhysicianName"];
const DATE_OF_BIRTH: &[&str] = &["dateOfBirth", "dob"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Normalize one raw row into an [`OrderRecord`].
///
/// Missing identifying fields come out as empty strings; rejecting them is
/// the validator's job.
pub fn normalize(row: &RawRow) -> OrderRecord {
    let text = |keys: &[&str]| row.first_present(keys).map(str::to_string);
    let date = |keys: &[&str]| row.first_present(keys).and_then(parse_date);

    OrderRecord {
        order_id: text(ORDER_ID).unwrap_or_default(),
        email: text(&["email"]).unwrap_or_default(),
        status: text(STATUS),
        confirmation_code: text(&["confirmationCode"]),
        created_at: date(CREATED_AT),
        expires_at: date(EXPIRES_AT),
        address: text(&["address"]),
        visit_type: text(&["visitType"]),
        test_types: text(&["testTypes"]),
        reason_for_testing: text(&["reasonForTesting"]),
        link: text(LINK),
        physician_name: text(PHYSICIAN_NAME),
        external_id: text(&["externalId"]),
        provider_id: row.first_present(&["providerId"]).and_then(parse_number),
        first_name: text(&["firstName"]),
        last_name: text(&["lastName"]),
        date_of_birth: date(DATE_OF_BIRTH),
        state: text(&["state"]),
        account_number: text(&["accountNumber"]),
        home_phone: text(&["homePhone"]),
        work_phone: text(&["workPhone"]),
        mobile_phone: text(&["mobilePhone"]),
        zip: text(&["zip"]),
        gender: text(&["gender"]),
    }
}

/// Parse a timestamp in any of the accepted shapes; naive values are UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an integer; integral floats such as `"42.0"` are accepted.
pub fn parse_number(input: &str) -> Option<i64> {
    let input = input.trim();
    if let Ok(n) = input.parse::<i64>() {
        return Some(n);
    }
    match input.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(f as i64)
        }
        _ => None,
    }
}
