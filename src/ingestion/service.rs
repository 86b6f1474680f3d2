//! Ingestion service driving both upload shapes through the pipeline

use super::batch::{BatchInserter, BatchReport};
use super::csv_reader::{CsvEncoding, CsvOrderReader};
use super::upload::ScopedUpload;
use super::{IngestionError, IngestionResponse, IngestionResult};
use crate::config::ServerConfig;
use crate::forward::Forwarder;
use crate::order::{normalize, validate_payload, validate_record, OrderRecord};
use crate::store::OrderStore;
use log::{error, info, warn};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::task;

/// Valid records read from one source
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub records: Vec<OrderRecord>,
    /// 1-based source row of each entry in `records`
    pub source_rows: Vec<usize>,
    pub total_rows: usize,
}

impl ParsedRows {
    pub fn skipped(&self) -> usize {
        self.total_rows - self.records.len()
    }

    fn push(&mut self, row: usize, record: OrderRecord) {
        self.source_rows.push(row);
        self.records.push(record);
    }
}

/// Stream a CSV file, keeping the rows that carry `orderId` and `email`.
///
/// Rows are numbered from 1, excluding the header.
pub fn read_csv(
    path: &Path,
    encoding: CsvEncoding,
    client_ip: &str,
) -> IngestionResult<ParsedRows> {
    let reader = CsvOrderReader::open(path, encoding)?;
    let mut parsed = ParsedRows::default();

    for row in reader {
        let row = row?;
        parsed.total_rows += 1;
        let record = normalize(&row);
        match validate_record(&record) {
            Ok(()) => parsed.push(parsed.total_rows, record),
            Err(e) => warn!("[{}] Skipping row {}: {}", client_ip, parsed.total_rows, e),
        }
    }

    info!(
        "[{}] Parsed {} rows ({} valid, {} skipped)",
        client_ip,
        parsed.total_rows,
        parsed.records.len(),
        parsed.skipped()
    );
    Ok(parsed)
}

/// Run file and store work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> IngestionResult<T>
where
    F: FnOnce() -> IngestionResult<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(|e| IngestionError::Task(e.to_string()))?
}

/// Shared by every request through the application state.
pub struct OrderIngestionService {
    store: Arc<dyn OrderStore>,
    inserter: BatchInserter,
    encoding: CsvEncoding,
    forwarder: Option<Forwarder>,
}

impl OrderIngestionService {
    /// Build the service from resolved configuration.
    pub fn new(store: Arc<dyn OrderStore>, config: &ServerConfig) -> IngestionResult<Self> {
        let forwarder = Forwarder::from_config(&config.forward)
            .map_err(|e| IngestionError::configuration(e.to_string()))?;

        Ok(Self {
            store,
            inserter: BatchInserter::new(config.batch_size),
            encoding: config.csv_encoding,
            forwarder,
        })
    }

    /// Replace the forwarder, e.g. with a custom transport.
    pub fn with_forwarder(mut self, forwarder: Forwarder) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Ingest an uploaded CSV file. The upload is deleted on every path.
    pub async fn ingest_csv_upload(
        &self,
        upload: ScopedUpload,
        client_ip: &str,
    ) -> IngestionResult<IngestionResponse> {
        info!(
            "[{}] Processing CSV upload {} ({} bytes)",
            client_ip,
            upload.original_name().unwrap_or("<unnamed>"),
            upload.bytes_written()
        );

        let path = upload.path().to_path_buf();
        let encoding = self.encoding;
        let ip = client_ip.to_string();
        let outcome = match run_blocking(move || read_csv(&path, encoding, &ip)).await {
            Ok(parsed) => self.persist(parsed, client_ip).await,
            Err(e) => Err(e),
        };

        if let Err(e) = upload.cleanup() {
            error!("[{}] Error deleting file: {}", client_ip, e);
        }

        let (parsed, response, report) = outcome.map_err(|e| {
            error!("[{}] CSV ingestion failed: {}", client_ip, e);
            e
        })?;
        Ok(self.forward(&parsed, &report, response, client_ip).await)
    }

    /// Ingest a JSON array; the payload is validated as a whole first.
    pub async fn ingest_json(
        &self,
        payload: &Value,
        client_ip: &str,
    ) -> IngestionResult<IngestionResponse> {
        let rows = validate_payload(payload).map_err(|e| {
            warn!("[{}] Rejected JSON payload: {}", client_ip, e);
            e
        })?;
        info!("[{}] Processing JSON payload of {} records", client_ip, rows.len());

        let mut parsed = ParsedRows {
            total_rows: rows.len(),
            ..Default::default()
        };
        // A valid payload has no rejected elements, so positions are source rows
        for (index, row) in rows.iter().enumerate() {
            parsed.push(index + 1, normalize(row));
        }

        let (parsed, response, report) = self.persist(parsed, client_ip).await?;
        Ok(self.forward(&parsed, &report, response, client_ip).await)
    }

    async fn persist(
        &self,
        parsed: ParsedRows,
        client_ip: &str,
    ) -> IngestionResult<(ParsedRows, IngestionResponse, BatchReport)> {
        let store = Arc::clone(&self.store);
        let inserter = self.inserter;
        let ip = client_ip.to_string();
        let (parsed, report) = run_blocking(move || {
            let report = inserter.insert_all(store.as_ref(), &parsed.records, &ip);
            Ok((parsed, report))
        })
        .await?;

        if report.is_total_failure() {
            error!(
                "[{}] No records persisted, {} batches failed",
                client_ip,
                report.failed_batches.len()
            );
            return Err(IngestionError::store(report.error_messages().join("; ")));
        }

        let response = IngestionResponse::success(parsed.total_rows, parsed.records.len(), &report);
        if report.failed_batches.is_empty() && report.record_errors.is_empty() {
            info!("[{}] {}", client_ip, response.message);
        } else {
            warn!(
                "[{}] {} with {} errors",
                client_ip,
                response.message,
                response.errors.len()
            );
        }
        Ok((parsed, response, report))
    }

    async fn forward(
        &self,
        parsed: &ParsedRows,
        report: &BatchReport,
        mut response: IngestionResponse,
        client_ip: &str,
    ) -> IngestionResponse {
        let Some(forwarder) = &self.forwarder else {
            return response;
        };

        let persisted = report
            .persisted(&parsed.records)
            .into_iter()
            .map(|(index, record)| (parsed.source_rows[index], record));
        let forward_report = forwarder.forward_all(persisted, client_ip).await;
        response.forwarded = Some(forward_report.forwarded);
        if forward_report.has_failures() {
            response.message = format!(
                "{} records inserted, {} of {} failed to forward",
                response.inserted,
                forward_report.errors.len(),
                forward_report.attempted
            );
            for message in forward_report.errors {
                response.add_error(message);
            }
        }
        response
    }
}
