//! Relay of persisted orders to an external API.
//!
//! Records are sent one call at a time, in order, with no retries. A failed
//! call is recorded against its 1-based row number and the loop moves on;
//! forwarding never undoes persistence.

pub mod client;
pub mod payload;

pub use client::HttpForwardTransport;
pub use payload::{build_payload, ForwardPayload};

use crate::config::ForwardConfig;
use crate::order::OrderRecord;
use async_trait::async_trait;
use log::{error, info};
use std::sync::Arc;
use thiserror::Error;

/// Errors from a single outbound call
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type ForwardResult<T> = Result<T, ForwardError>;

/// Sends one payload to the external system.
#[async_trait]
pub trait ForwardTransport: Send + Sync {
    async fn send(&self, payload: &ForwardPayload) -> ForwardResult<()>;
}

/// Outcome of forwarding a set of records
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForwardReport {
    pub attempted: usize,
    pub forwarded: usize,
    /// "Row {n}: {message}" for every failed call
    pub errors: Vec<String>,
}

impl ForwardReport {
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone)]
pub struct Forwarder {
    transport: Arc<dyn ForwardTransport>,
}

impl Forwarder {
    pub fn new(transport: Arc<dyn ForwardTransport>) -> Self {
        Self { transport }
    }

    /// HTTP forwarder for the configured endpoint, or `None` when forwarding is off.
    pub fn from_config(config: &ForwardConfig) -> ForwardResult<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }
        let transport = HttpForwardTransport::new(config)?;
        info!("Forwarding enabled to {}", transport.url());
        Ok(Some(Self::new(Arc::new(transport))))
    }

    /// Forward every record sequentially.
    ///
    /// Each record is paired with its 1-based row in the source upload, which
    /// is the number reported when its call fails.
    pub async fn forward_all<'a, I>(&self, records: I, client_ip: &str) -> ForwardReport
    where
        I: IntoIterator<Item = (usize, &'a OrderRecord)>,
    {
        let mut report = ForwardReport::default();

        for (row, record) in records {
            report.attempted += 1;
            let payload = build_payload(record);

            match self.transport.send(&payload).await {
                Ok(()) => report.forwarded += 1,
                Err(e) => {
                    error!(
                        "[{}] Forwarding row {} (orderId {}) failed: {}",
                        client_ip, row, record.order_id, e
                    );
                    report.errors.push(format!("Row {}: {}", row, e));
                }
            }
        }

        info!(
            "[{}] Forwarded {} of {} orders",
            client_ip, report.forwarded, report.attempted
        );
        report
    }
}
