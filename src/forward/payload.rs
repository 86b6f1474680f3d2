//! Shape of the document sent to the external orders API

use crate::order::OrderRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One forwarded order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardPayload {
    pub order_id: String,
    pub status: Option<String>,
    pub confirmation_code: Option<String>,
    pub provider_id: Option<i64>,
    pub external_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub visit_type: Option<String>,
    pub customer: Customer,
    pub address: Address,
    pub physician_review: PhysicianReview,
    pub link: Link,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<String>,
    pub home_phone: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicianReview {
    pub physician_name: Option<String>,
    pub reason_for_testing: Option<String>,
    pub test_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub url: Option<String>,
}

/// Build the outbound document for one record.
pub fn build_payload(record: &OrderRecord) -> ForwardPayload {
    let (line, city) = split_address(record.address.as_deref());

    ForwardPayload {
        order_id: record.order_id.clone(),
        status: record.status.clone(),
        confirmation_code: record.confirmation_code.clone(),
        provider_id: record.provider_id,
        external_id: record.external_id.clone(),
        created_at: record.created_at,
        expires_at: record.expires_at,
        visit_type: record.visit_type.clone(),
        customer: Customer {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            date_of_birth: record.date_of_birth,
            gender: record.gender.clone(),
            home_phone: record.home_phone.clone(),
            work_phone: record.work_phone.clone(),
            mobile_phone: record.mobile_phone.clone(),
            account_number: record.account_number.clone(),
        },
        address: Address {
            line,
            city,
            state: record.state.clone(),
            zip: record.zip.clone(),
        },
        physician_review: PhysicianReview {
            physician_name: record.physician_name.clone(),
            reason_for_testing: record.reason_for_testing.clone(),
            test_types: record.test_type_list(),
        },
        link: Link {
            url: record.link.clone(),
        },
    }
}

/// "line, city" split on the first comma.
fn split_address(address: Option<&str>) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    match address {
        Some(text) => match text.split_once(',') {
            Some((line, city)) => (non_empty(line), non_empty(city)),
            None => (non_empty(text), None),
        },
        None => (None, None),
    }
}
