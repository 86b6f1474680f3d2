//! Tests for ingestion functionality

use crate::config::ServerConfig;
use crate::forward::{ForwardError, ForwardPayload, ForwardResult, ForwardTransport, Forwarder};
use crate::ingestion::{
    ErrorResponse, IngestionError, IngestionResponse, OrderIngestionService, ScopedUpload,
};
use crate::order::{OrderRecord, PayloadError};
use crate::store::{
    BulkInsertOutcome, OrderStore, SledOrderStore, StoreError, StoreResult,
};
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn create_test_config() -> ServerConfig {
    ServerConfig {
        batch_size: 10,
        ..Default::default()
    }
}

fn create_test_store(dir: &TempDir) -> Arc<SledOrderStore> {
    Arc::new(SledOrderStore::open(dir.path().join("db")).unwrap())
}

fn create_service(store: Arc<dyn OrderStore>) -> OrderIngestionService {
    OrderIngestionService::new(store, &create_test_config()).unwrap()
}

fn csv_with_rows(n: usize) -> String {
    let mut csv = String::from("orderId,email,createdAt,providerId\n");
    for i in 0..n {
        csv.push_str(&format!("O{},user{}@x.com,2024-01-0{}T10:00:00Z,{}\n", i, i, i % 9 + 1, i));
    }
    csv
}

fn write_upload(dir: &Path, content: &str) -> (ScopedUpload, PathBuf) {
    let mut upload = ScopedUpload::create_in(dir).unwrap();
    upload.write_chunk(content.as_bytes()).unwrap();
    upload.finish().unwrap();
    let path = upload.path().to_path_buf();
    (upload, path)
}

/// Store whose every bulk insert fails
#[derive(Default)]
struct FailingStore {
    calls: AtomicUsize,
}

impl OrderStore for FailingStore {
    fn insert_many_unordered(&self, _records: &[OrderRecord]) -> StoreResult<BulkInsertOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(0)
    }

    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Transport rejecting the listed order ids
#[derive(Default)]
struct MockTransport {
    reject: Vec<String>,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl ForwardTransport for MockTransport {
    async fn send(&self, payload: &ForwardPayload) -> ForwardResult<()> {
        self.sent.lock().unwrap().push(payload.order_id.clone());
        if self.reject.contains(&payload.order_id) {
            return Err(ForwardError::Status {
                status: 500,
                body: "upstream down".to_string(),
            });
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_twelve_csv_rows_insert_in_two_batches() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let (upload, path) = write_upload(&dir.path().join("uploads"), &csv_with_rows(12));

    let response = service.ingest_csv_upload(upload, "127.0.0.1").await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.total_rows, 12);
    assert_eq!(response.inserted, 12);
    assert_eq!(response.batches, 2);
    assert_eq!(response.forwarded, None);
    assert_eq!(store.count().unwrap(), 12);
    assert!(!path.exists());

    let stored = store.list_orders().unwrap();
    assert_eq!(stored[0].record.order_id, "O0");
    assert_eq!(stored[0].record.provider_id, Some(0));
    assert!(stored[0].record.created_at.is_some());
}

#[tokio::test]
async fn test_invalid_csv_rows_are_skipped() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let csv = "orderId,email,providerId,dateOfBirth\n\
               A1,a@x.com,abc,not-a-date\n\
               ,b@x.com,2,\n\
               A3,,3,\n\
               A4,d@x.com,4,01/31/1990\n";
    let (upload, _) = write_upload(dir.path(), csv);

    let response = service.ingest_csv_upload(upload, "127.0.0.1").await.unwrap();

    assert_eq!(response.total_rows, 4);
    assert_eq!(response.valid_rows, 2);
    assert_eq!(response.skipped_rows, 2);
    assert_eq!(response.inserted, 2);

    let stored = store.list_orders().unwrap();
    assert_eq!(stored[0].record.provider_id, None);
    assert_eq!(stored[0].record.date_of_birth, None);
    assert!(stored[1].record.date_of_birth.is_some());
}

#[tokio::test]
async fn test_upload_removed_after_parse_error() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let (upload, path) = write_upload(dir.path(), "orderId,email\nA1,a@x.com\nA2\n");

    let err = service
        .ingest_csv_upload(upload, "127.0.0.1")
        .await
        .unwrap_err();

    assert!(matches!(err, IngestionError::CsvParse(_)));
    assert_eq!(err.status_code().as_u16(), 400);
    assert!(!path.exists());
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_upload_removed_after_store_error() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FailingStore::default());
    let service = create_service(store.clone());
    let (upload, path) = write_upload(dir.path(), &csv_with_rows(3));

    let err = service
        .ingest_csv_upload(upload, "127.0.0.1")
        .await
        .unwrap_err();

    assert!(matches!(err, IngestionError::Store(_)));
    assert_eq!(err.status_code().as_u16(), 500);
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_header_only_csv_inserts_nothing() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let (upload, _) = write_upload(dir.path(), "orderId,email\n");

    let response = service.ingest_csv_upload(upload, "127.0.0.1").await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.inserted, 0);
    assert_eq!(response.batches, 0);
}

#[tokio::test]
async fn test_json_with_invalid_record_inserts_nothing() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let payload = json!([
        {"orderId": "A1", "email": "a@x.com"},
        {"orderId": "", "email": "b@x.com"}
    ]);

    let err = service.ingest_json(&payload, "127.0.0.1").await.unwrap_err();

    assert!(matches!(
        err,
        IngestionError::InvalidPayload(PayloadError::InvalidRecords { invalid: 1 })
    ));
    let body = ErrorResponse::from_error(&err);
    assert_eq!(body.status, "error");
    assert_eq!(body.invalid_count, Some(1));
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_json_array_never_touches_store() {
    let store = Arc::new(FailingStore::default());
    let service = create_service(store.clone());

    for payload in [json!([]), json!({"orderId": "A1"}), json!("text")] {
        let err = service.ingest_json(&payload, "127.0.0.1").await.unwrap_err();
        assert!(matches!(
            err,
            IngestionError::InvalidPayload(PayloadError::NotANonEmptyArray)
        ));
    }
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_json_records_are_normalized_and_stored() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let payload = json!([
        {"pwnOrderId": "P1", "email": "a@x.com", "providerId": 42, "pwnOrderStatus": "new"},
        {"orderId": "P2", "email": "b@x.com", "createdAt": "2024-03-01 08:30:00"}
    ]);

    let response: IngestionResponse = service.ingest_json(&payload, "10.0.0.1").await.unwrap();

    assert_eq!(response.inserted, 2);
    assert_eq!(response.batches, 1);
    let stored = store.list_orders().unwrap();
    assert_eq!(stored[0].record.order_id, "P1");
    assert_eq!(stored[0].record.provider_id, Some(42));
    assert_eq!(stored[0].record.status.as_deref(), Some("new"));
    assert!(stored[1].record.created_at.is_some());
}

#[tokio::test]
async fn test_reupload_duplicates_documents() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let payload = json!([{"orderId": "A1", "email": "a@x.com"}]);

    service.ingest_json(&payload, "127.0.0.1").await.unwrap();
    service.ingest_json(&payload, "127.0.0.1").await.unwrap();

    let stored = store.list_orders().unwrap();
    assert_eq!(stored.len(), 2);
    assert_ne!(stored[0].id, stored[1].id);
}

#[tokio::test]
async fn test_forwarding_failure_reports_row_and_keeps_records() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let transport = Arc::new(MockTransport {
        reject: vec!["A2".to_string()],
        ..Default::default()
    });
    let service =
        create_service(store.clone()).with_forwarder(Forwarder::new(transport.clone()));
    let payload = json!([
        {"orderId": "A1", "email": "a@x.com"},
        {"orderId": "A2", "email": "b@x.com"},
        {"orderId": "A3", "email": "c@x.com"}
    ]);

    let response = service.ingest_json(&payload, "127.0.0.1").await.unwrap();

    assert!(!response.is_success());
    assert_eq!(response.forwarded, Some(2));
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].starts_with("Row 2: "));
    assert_eq!(*transport.sent.lock().unwrap(), vec!["A1", "A2", "A3"]);
    assert_eq!(store.count().unwrap(), 3);
}

#[tokio::test]
async fn test_forwarding_success_reports_count() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let transport = Arc::new(MockTransport::default());
    let service = create_service(store).with_forwarder(Forwarder::new(transport));
    let (upload, _) = write_upload(dir.path(), &csv_with_rows(4));

    let response = service.ingest_csv_upload(upload, "127.0.0.1").await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.forwarded, Some(4));
    assert!(response.errors.is_empty());
}

/// Store rejecting its first bulk insert and writing every later one
struct FirstBatchFailsStore {
    inner: Arc<SledOrderStore>,
    calls: AtomicUsize,
}

impl OrderStore for FirstBatchFailsStore {
    fn insert_many_unordered(&self, records: &[OrderRecord]) -> StoreResult<BulkInsertOutcome> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.insert_many_unordered(records)
    }

    fn count(&self) -> StoreResult<usize> {
        self.inner.count()
    }

    fn flush(&self) -> StoreResult<()> {
        self.inner.flush()
    }
}

#[tokio::test]
async fn test_failed_batch_keeps_later_batches_and_succeeds() {
    let dir = TempDir::new().unwrap();
    let inner = create_test_store(&dir);
    let store = Arc::new(FirstBatchFailsStore {
        inner: inner.clone(),
        calls: AtomicUsize::new(0),
    });
    let transport = Arc::new(MockTransport::default());
    let service =
        create_service(store.clone()).with_forwarder(Forwarder::new(transport.clone()));
    let (upload, path) = write_upload(dir.path(), &csv_with_rows(12));

    let response = service.ingest_csv_upload(upload, "127.0.0.1").await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.total_rows, 12);
    assert_eq!(response.valid_rows, 12);
    assert_eq!(response.inserted, 2);
    assert_eq!(response.batches, 2);
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].starts_with("Batch 1 (10 records) failed"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    assert_eq!(inner.count().unwrap(), 2);
    assert_eq!(*transport.sent.lock().unwrap(), vec!["O10", "O11"]);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_forwarding_failure_names_source_row_after_skipped_rows() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let transport = Arc::new(MockTransport {
        reject: vec!["A3".to_string()],
        ..Default::default()
    });
    let service =
        create_service(store.clone()).with_forwarder(Forwarder::new(transport.clone()));
    let csv = "orderId,email\nA1,a@x.com\nA2,\nA3,c@x.com\n";
    let (upload, _) = write_upload(dir.path(), csv);

    let response = service.ingest_csv_upload(upload, "127.0.0.1").await.unwrap();

    assert_eq!(response.valid_rows, 2);
    assert_eq!(response.forwarded, Some(1));
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].starts_with("Row 3: "));
    assert_eq!(*transport.sent.lock().unwrap(), vec!["A1", "A3"]);
}

#[tokio::test]
async fn test_json_zero_and_false_identifiers_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = create_test_store(&dir);
    let service = create_service(store.clone());
    let payload = json!([
        {"orderId": 0, "email": "a@x.com"},
        {"orderId": "A2", "email": false},
        {"orderId": "A3", "email": "c@x.com"}
    ]);

    let err = service.ingest_json(&payload, "127.0.0.1").await.unwrap_err();

    assert!(matches!(
        err,
        IngestionError::InvalidPayload(PayloadError::InvalidRecords { invalid: 2 })
    ));
    assert_eq!(err.status_code(), actix_web::http::StatusCode::BAD_REQUEST);
    assert_eq!(store.count().unwrap(), 0);
}
