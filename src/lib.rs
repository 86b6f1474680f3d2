//! # Order Ingest Library
//!
//! This library implements an order-record ingestion service. Orders arrive
//! either as an uploaded CSV file or as a JSON array posted over HTTP, are
//! normalized into a canonical record, validated, and persisted to a
//! document store in fixed-size batches.
//!
//! ## Core Components
//!
//! * `order` - Canonical order record, raw rows, normalization and validation
//! * `store` - Document store handle with unordered bulk inserts
//! * `ingestion` - CSV reader, scoped uploads, batch inserter and the ingestion service
//! * `forward` - Optional relay of persisted records to an external API
//! * `server` - HTTP routes and server wiring
//! * `config` - Server configuration resolved once at startup
//! * `logging` - Tracing subscriber setup with console and file outputs
//! * `error` - Startup error type
//!
//! ## Architecture
//!
//! A request flows through the pipeline in source order:
//! 1. Read rows (CSV stream or JSON array)
//! 2. Normalize each row into an [`OrderRecord`]
//! 3. Skip rows missing `orderId` or `email`
//! 4. Insert the valid records batch by batch, isolating failures per batch
//! 5. Optionally forward every record to the configured external API
//! 6. Remove the temporary upload, whatever the outcome

pub mod config;
pub mod error;
pub mod forward;
pub mod ingestion;
pub mod logging;
pub mod order;
pub mod server;
pub mod store;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use ingestion::{IngestionError, IngestionResponse, OrderIngestionService};
pub use order::OrderRecord;
pub use server::OrderIngestServer;
pub use store::{OrderStore, SledOrderStore, StoreError};
