//! Tests for async chunked execution and cancellation.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tablemap::config::MapperSettings;
use tablemap::entity::{Entity, EntityDeclaration, FieldKind};
use tablemap::mapper::{AsyncConnection, AsyncConnector, IdFilter};
use tablemap::query::{base_ids, QueryBase};
use tablemap::sql::{Statement, Value};
use tablemap::{ExecuteError, Mapper};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Invoice {
    id: i32,
}

impl Entity for Invoice {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("invoices", "i")
            .field("Id", FieldKind::Integer)
            .field("Total", FieldKind::Decimal);
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("driver error: {0}")]
struct DriverError(String);

#[derive(Default)]
struct Counters {
    statements: Mutex<Vec<Statement>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    open: AtomicUsize,
}

#[derive(Default)]
struct MockConnector {
    counters: Arc<Counters>,
    fail_on: Option<i32>,
    hang: bool,
}

struct MockConnection {
    counters: Arc<Counters>,
    fail_on: Option<i32>,
    hang: bool,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
    }
}

fn bound_ids(statement: &Statement) -> Vec<i32> {
    match statement.param("@iId") {
        Some(Value::IntList(ids)) => ids.iter().map(|&id| id as i32).collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl AsyncConnection<Invoice> for MockConnection {
    type Error = DriverError;

    async fn query(&mut self, statement: &Statement) -> Result<Vec<Invoice>, DriverError> {
        self.counters
            .statements
            .lock()
            .unwrap()
            .push(statement.clone());

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hang {
            std::future::pending::<()>().await;
        }
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);

        let ids = bound_ids(statement);
        if let Some(bad) = self.fail_on.filter(|bad| ids.contains(bad)) {
            return Err(DriverError(format!("invoice {} is archived", bad)));
        }
        Ok(ids.into_iter().map(|id| Invoice { id }).collect())
    }
}

#[async_trait]
impl AsyncConnector<Invoice> for MockConnector {
    type Error = DriverError;
    type Connection = MockConnection;

    async fn connect(&self, _connection_string: &str) -> Result<MockConnection, DriverError> {
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            counters: Arc::clone(&self.counters),
            fail_on: self.fail_on,
            hang: self.hang,
        })
    }
}

fn mapper(max_chunk_size: usize) -> Mapper<Invoice, QueryBase, IdFilter> {
    let settings = MapperSettings::new("Server=mock")
        .with_max_chunk_size(NonZeroUsize::new(max_chunk_size).unwrap());
    Mapper::<Invoice, QueryBase>::new(settings)
        .unwrap()
        .with_extension(IdFilter::default())
        .chunk_on(base_ids())
}

fn invoices(ids: impl IntoIterator<Item = i32>) -> Vec<Invoice> {
    ids.into_iter().map(|id| Invoice { id }).collect()
}

#[tokio::test]
async fn test_chunks_run_concurrently_and_keep_order() {
    let connector = MockConnector::default();
    let query = QueryBase::new().with_ids((1..=4500).collect::<Vec<_>>());

    let rows = mapper(2000).get_results_async(&query, &connector).await.unwrap();

    assert_eq!(rows, invoices(1..=4500));
    assert_eq!(connector.counters.statements.lock().unwrap().len(), 3);
    assert_eq!(connector.counters.max_in_flight.load(Ordering::SeqCst), 3);
    assert_eq!(connector.counters.open.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_async_matches_blocking_semantics() {
    let query = QueryBase::new().with_ids((1..=30).rev().collect::<Vec<_>>());

    let chunked = mapper(7)
        .get_results_async(&query, &MockConnector::default())
        .await
        .unwrap();
    let single = mapper(100)
        .get_results_async(&query, &MockConnector::default())
        .await
        .unwrap();

    assert_eq!(chunked, single);
}

#[tokio::test]
async fn test_failure_propagates() {
    let connector = MockConnector {
        fail_on: Some(12),
        ..MockConnector::default()
    };
    let query = QueryBase::new().with_ids((1..=20).collect::<Vec<_>>());

    let err = mapper(5)
        .get_results_async(&query, &connector)
        .await
        .unwrap_err();

    assert_eq!(err, DriverError("invoice 12 is archived".into()));
}

#[tokio::test]
async fn test_distinct_async() {
    let query = QueryBase::new().with_ids(vec![3, 3, 1, 3]);
    let rows = mapper(1)
        .get_results_distinct_async(&query, &MockConnector::default())
        .await
        .unwrap();

    assert_eq!(rows, invoices([3, 1]));
}

#[tokio::test]
async fn test_single_result_async() {
    let connector = MockConnector::default();
    let mapper = mapper(2);

    let first = mapper
        .get_single_result_async(&QueryBase::new().with_ids(vec![9, 8, 7]), &connector)
        .await
        .unwrap();
    assert_eq!(first, Some(Invoice { id: 9 }));

    let none = mapper
        .get_single_result_async(&QueryBase::new(), &connector)
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn test_cancellation_drops_in_flight_chunks() {
    let connector = MockConnector {
        hang: true,
        ..MockConnector::default()
    };
    let query = QueryBase::new().with_ids((1..=10).collect::<Vec<_>>());

    let result = mapper(4)
        .get_results_cancellable(
            &query,
            &connector,
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;

    assert!(matches!(result, Err(ExecuteError::Cancelled)));
    assert_eq!(connector.counters.statements.lock().unwrap().len(), 3);
    assert_eq!(connector.counters.open.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancellable_completes_without_signal() {
    let query = QueryBase::new().with_ids(vec![1, 2, 3]);

    let rows = mapper(2)
        .get_results_cancellable(
            &query,
            &MockConnector::default(),
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

    assert_eq!(rows, invoices(1..=3));
}

#[tokio::test]
async fn test_cancellable_surfaces_execution_error() {
    let connector = MockConnector {
        fail_on: Some(2),
        ..MockConnector::default()
    };
    let query = QueryBase::new().with_ids(vec![1, 2, 3]);

    let err = mapper(10)
        .get_results_cancellable(&query, &connector, std::future::pending::<()>())
        .await
        .unwrap_err();

    assert!(!err.is_cancelled());
    assert_eq!(
        err.into_execution(),
        Some(DriverError("invoice 2 is archived".into()))
    );
}
