//! Fixed-size batch insertion with per-batch failure isolation

use crate::order::OrderRecord;
use crate::store::{OrderStore, RecordInsertError};
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;

/// A batch the store rejected as a whole
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Zero-based batch number
    pub batch: usize,
    /// Number of records in the batch
    pub size: usize,
    pub message: String,
}

/// Aggregate outcome of inserting a sequence of records
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batches_attempted: usize,
    pub inserted: usize,
    pub failed_batches: Vec<BatchFailure>,
    /// Record failures inside otherwise written batches; indexes are global
    pub record_errors: Vec<RecordInsertError>,
    failed_indexes: BTreeSet<usize>,
}

impl BatchReport {
    /// Nothing was persisted although at least one batch was rejected.
    pub fn is_total_failure(&self) -> bool {
        self.inserted == 0 && !self.failed_batches.is_empty()
    }

    /// Whether the record at `index` of the submitted slice was not persisted.
    pub fn is_failed(&self, index: usize) -> bool {
        self.failed_indexes.contains(&index)
    }

    /// Records of `submitted` that made it into the store, in order, with
    /// their index in `submitted`.
    pub fn persisted<'a>(&self, submitted: &'a [OrderRecord]) -> Vec<(usize, &'a OrderRecord)> {
        submitted
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.is_failed(*index))
            .collect()
    }

    /// Human-readable failure lines for responses.
    pub fn error_messages(&self) -> Vec<String> {
        let batches = self
            .failed_batches
            .iter()
            .map(|f| format!("Batch {} ({} records) failed: {}", f.batch + 1, f.size, f.message));
        let records = self.record_errors.iter().map(|e| {
            format!("Record {} (orderId {}) failed: {}", e.index + 1, e.order_id, e.message)
        });
        batches.chain(records).collect()
    }
}

/// Splits records into consecutive groups and inserts each independently.
#[derive(Debug, Clone, Copy)]
pub struct BatchInserter {
    batch_size: usize,
}

impl BatchInserter {
    /// A zero batch size is raised to one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Insert `records` batch by batch.
    ///
    /// A failing batch is logged and recorded; later batches still run.
    pub fn insert_all(
        &self,
        store: &dyn OrderStore,
        records: &[OrderRecord],
        client_ip: &str,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for (batch, chunk) in records.chunks(self.batch_size).enumerate() {
            let offset = batch * self.batch_size;
            report.batches_attempted += 1;

            match store.insert_many_unordered(chunk) {
                Ok(outcome) => {
                    report.inserted += outcome.inserted;
                    if outcome.errors.is_empty() {
                        info!(
                            "[{}] Batch {}: inserted {} orders",
                            client_ip,
                            batch + 1,
                            outcome.inserted
                        );
                    } else {
                        warn!(
                            "[{}] Batch {}: inserted {} of {} orders",
                            client_ip,
                            batch + 1,
                            outcome.inserted,
                            chunk.len()
                        );
                    }
                    for mut failure in outcome.errors {
                        failure.index += offset;
                        report.failed_indexes.insert(failure.index);
                        report.record_errors.push(failure);
                    }
                }
                Err(e) => {
                    error!(
                        "[{}] Batch {} of {} records failed: {}",
                        client_ip,
                        batch + 1,
                        chunk.len(),
                        e
                    );
                    report.failed_indexes.extend(offset..offset + chunk.len());
                    report.failed_batches.push(BatchFailure {
                        batch,
                        size: chunk.len(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
