//! Document store for order records.
//!
//! The store is opened once at startup and shared by every request. Each
//! record is written as its own JSON document in the `orders` tree, wrapped
//! in a [`StoredOrder`] envelope carrying a generated `_id`. Nothing here
//! enforces uniqueness of `orderId`.

use crate::order::OrderRecord;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

const ORDERS_TREE: &str = "orders";

/// Errors raised by the document store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store is unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A record that failed inside an otherwise attempted bulk insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordInsertError {
    /// Position of the record within the submitted group
    pub index: usize,
    pub order_id: String,
    pub message: String,
}

/// Outcome of one unordered bulk insert.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkInsertOutcome {
    pub inserted: usize,
    pub errors: Vec<RecordInsertError>,
}

/// The persisted document envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOrder {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub ingested_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: OrderRecord,
}

/// Persistence seam used by the batch inserter.
pub trait OrderStore: Send + Sync {
    /// Insert every record of the group, continuing past individual failures.
    ///
    /// An `Err` means the group as a whole could not be written.
    fn insert_many_unordered(&self, records: &[OrderRecord]) -> StoreResult<BulkInsertOutcome>;

    /// Number of persisted documents.
    fn count(&self) -> StoreResult<usize>;

    /// Make all writes durable.
    fn flush(&self) -> StoreResult<()>;
}

/// sled-backed [`OrderStore`]
#[derive(Clone)]
pub struct SledOrderStore {
    db: sled::Db,
    orders: sled::Tree,
}

impl SledOrderStore {
    /// Open (or create) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path.as_ref())?;
        let store = Self::from_db(db)?;
        info!(
            "Order store opened at {} ({} documents)",
            path.as_ref().display(),
            store.orders.len()
        );
        Ok(store)
    }

    /// Wrap an already opened database.
    pub fn from_db(db: sled::Db) -> StoreResult<Self> {
        let orders = db.open_tree(ORDERS_TREE)?;
        Ok(Self { db, orders })
    }

    /// All documents in insertion order.
    pub fn list_orders(&self) -> StoreResult<Vec<StoredOrder>> {
        let mut items = Vec::new();
        for result in self.orders.iter() {
            let (_, value) = result?;
            items.push(serde_json::from_slice(&value)?);
        }
        Ok(items)
    }

    /// Flush and release the handle.
    pub fn close(self) -> StoreResult<()> {
        let flushed = self.db.flush()?;
        info!("Order store closed ({} bytes flushed)", flushed);
        Ok(())
    }

    fn insert_one(&self, record: &OrderRecord) -> StoreResult<()> {
        let document = StoredOrder {
            id: Uuid::new_v4(),
            ingested_at: Utc::now(),
            record: record.clone(),
        };
        let bytes = serde_json::to_vec(&document)?;
        // Monotonic keys keep documents in insertion order
        let key = self.db.generate_id()?.to_be_bytes();
        self.orders.insert(key, bytes)?;
        Ok(())
    }
}

impl OrderStore for SledOrderStore {
    fn insert_many_unordered(&self, records: &[OrderRecord]) -> StoreResult<BulkInsertOutcome> {
        let mut outcome = BulkInsertOutcome::default();
        for (index, record) in records.iter().enumerate() {
            match self.insert_one(record) {
                Ok(()) => outcome.inserted += 1,
                Err(e) => {
                    warn!("Failed to insert order '{}': {}", record.order_id, e);
                    outcome.errors.push(RecordInsertError {
                        index,
                        order_id: record.order_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        debug!(
            "Bulk insert wrote {} of {} documents",
            outcome.inserted,
            records.len()
        );
        Ok(settle_flush(outcome, self.orders.flush()))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.orders.len())
    }

    fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// The records of a group are already written when its flush runs, so a
/// flush failure is logged and the outcome is kept.
fn settle_flush(outcome: BulkInsertOutcome, flushed: sled::Result<usize>) -> BulkInsertOutcome {
    if let Err(e) = flushed {
        error!(
            "Flush after writing {} documents failed: {}",
            outcome.inserted, e
        );
    }
    outcome
}
