use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::error::ExecutorError;
use crate::data::{ResultSet, Row, Schema};

/// One page of results from the backend: the schema, the rows decoded
/// against it, and a token for the next page when one exists.
#[derive(Debug, Default)]
pub struct QueryPage {
    pub schema: Schema,
    pub rows: Vec<Row>,
    pub next_page_token: Option<String>,
}

/// A live connection to one target.
///
/// Implementations only run the wire protocol; cancellation and timeouts
/// are enforced by the executor racing these futures, so a cancelled call
/// is simply dropped mid-flight.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn run_query(&self, text: &str) -> Result<QueryPage, ExecutorError>;
    async fn next_page(&self, token: &str) -> Result<QueryPage, ExecutorError>;
    async fn close(&self) -> Result<(), ExecutorError>;
}

/// Establishes connections on first use of a target.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &str) -> Result<Arc<dyn Connection>, ExecutorError>;
}

/// Owns the per-target connection cache and submits queries under a
/// cancellation token.
///
/// The cache is guarded by a single private mutex; nothing outside this
/// type ever touches it, background tasks included.
pub struct QueryExecutor {
    connector: Box<dyn Connector>,
    connections: Mutex<HashMap<String, Arc<dyn Connection>>>,
    timeout: Option<Duration>,
}

impl QueryExecutor {
    /// A zero timeout means "backend default/maximum": no local limit.
    pub fn new(connector: Box<dyn Connector>, timeout: Duration) -> Self {
        Self {
            connector,
            connections: Mutex::new(HashMap::new()),
            timeout: (!timeout.is_zero()).then_some(timeout),
        }
    }

    /// Submit a query against `target`, returning a lazy row stream.
    ///
    /// First use of a target establishes and caches its connection.
    /// The token cancels both the initial call and any later page fetch.
    pub async fn submit(
        &self,
        target: &str,
        query_text: &str,
        cancel: CancellationToken,
    ) -> Result<RowStream, ExecutorError> {
        if query_text.trim().is_empty() {
            return Err(ExecutorError::Query("query text is empty".to_string()));
        }

        let connection = self.connection(target).await?;
        debug!(project = target, "submitting query");
        let first = guarded(self.timeout, &cancel, connection.run_query(query_text)).await?;
        Ok(RowStream::new(connection, first, cancel, self.timeout))
    }

    /// Release every cached connection. Close failures are aggregated,
    /// never discarded.
    pub async fn close(&self) -> Result<(), ExecutorError> {
        let mut cache = self.connections.lock().await;
        let total = cache.len();
        let mut failures = Vec::new();
        for (target, connection) in cache.drain() {
            if let Err(e) = connection.close().await {
                warn!(project = %target, error = %e, "connection close failed");
                failures.push(format!("{target}: {e}"));
            }
        }
        info!(total, failed = failures.len(), "connections released");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExecutorError::Close { failures, total })
        }
    }

    async fn connection(&self, target: &str) -> Result<Arc<dyn Connection>, ExecutorError> {
        let mut cache = self.connections.lock().await;
        if let Some(connection) = cache.get(target) {
            return Ok(Arc::clone(connection));
        }
        info!(project = target, "establishing new connection");
        let connection = self.connector.connect(target).await?;
        cache.insert(target.to_string(), Arc::clone(&connection));
        Ok(connection)
    }
}

/// Race a transport call against the cancellation token and the
/// configured timeout. Dropping the inner future aborts the transfer.
async fn guarded<F>(
    limit: Option<Duration>,
    cancel: &CancellationToken,
    call: F,
) -> Result<QueryPage, ExecutorError>
where
    F: Future<Output = Result<QueryPage, ExecutorError>>,
{
    let bounded = async {
        match limit {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(ExecutorError::Timeout(limit)),
            },
            None => call.await,
        }
    };
    tokio::select! {
        _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
        result = bounded => result,
    }
}

/// A lazy, forward-only, single-pass sequence of result rows.
///
/// Holds the schema from the first page plus the buffered rows; further
/// pages are fetched only when the buffer drains.
impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream")
            .field("schema", &self.schema)
            .field("next_page_token", &self.next_page_token)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

pub struct RowStream {
    connection: Arc<dyn Connection>,
    schema: Schema,
    buffered: std::vec::IntoIter<Row>,
    next_page_token: Option<String>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl RowStream {
    fn new(
        connection: Arc<dyn Connection>,
        first: QueryPage,
        cancel: CancellationToken,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            connection,
            schema: first.schema,
            buffered: first.rows.into_iter(),
            next_page_token: first.next_page_token,
            cancel,
            timeout,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// True while the backend still holds unfetched pages.
    pub fn has_more_pages(&self) -> bool {
        self.next_page_token.is_some()
    }

    /// The next row, fetching a page when the buffer is empty.
    /// `None` once the last page drains.
    pub async fn next_row(&mut self) -> Result<Option<Row>, ExecutorError> {
        loop {
            if let Some(row) = self.buffered.next() {
                return Ok(Some(row));
            }
            let Some(token) = self.next_page_token.take() else {
                return Ok(None);
            };
            debug!("fetching next result page");
            let page = guarded(
                self.timeout,
                &self.cancel,
                self.connection.next_page(&token),
            )
            .await?;
            self.buffered = page.rows.into_iter();
            self.next_page_token = page.next_page_token;
        }
    }

    /// Drain into a materialized result set, stopping at `max_rows`
    /// (0 = no cap). Pages past the cap are never fetched; `truncated`
    /// records that rows were left behind.
    pub async fn collect(mut self, max_rows: usize) -> Result<ResultSet, ExecutorError> {
        let mut results = ResultSet::new(self.schema.clone());
        while max_rows == 0 || results.rows.len() < max_rows {
            match self.next_row().await? {
                Some(row) => results.rows.push(row),
                None => return Ok(results),
            }
        }
        results.truncated = self.buffered.len() > 0 || self.has_more_pages();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Field, Value, ValueKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn int_schema() -> Schema {
        Schema::new(vec![Field::new("n", ValueKind::Integer)])
    }

    fn int_page(values: std::ops::Range<i64>, next: Option<&str>) -> QueryPage {
        QueryPage {
            schema: int_schema(),
            rows: values
                .map(|n| Row::new(vec![Value::Integer(n)]))
                .collect(),
            next_page_token: next.map(str::to_string),
        }
    }

    struct PagedConnection {
        fetched_pages: AtomicUsize,
    }

    #[async_trait]
    impl Connection for PagedConnection {
        async fn run_query(&self, _text: &str) -> Result<QueryPage, ExecutorError> {
            Ok(int_page(0..3, Some("page-1")))
        }

        async fn next_page(&self, token: &str) -> Result<QueryPage, ExecutorError> {
            self.fetched_pages.fetch_add(1, Ordering::SeqCst);
            match token {
                "page-1" => Ok(int_page(3..6, Some("page-2"))),
                "page-2" => Ok(int_page(6..9, None)),
                other => Err(ExecutorError::Query(format!("bad token {other}"))),
            }
        }

        async fn close(&self) -> Result<(), ExecutorError> {
            Ok(())
        }
    }

    struct PagedConnector {
        connects: AtomicUsize,
    }

    #[async_trait]
    impl Connector for PagedConnector {
        async fn connect(&self, _target: &str) -> Result<Arc<dyn Connection>, ExecutorError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(PagedConnection {
                fetched_pages: AtomicUsize::new(0),
            }))
        }
    }

    fn paged_executor() -> (QueryExecutor, Arc<PagedConnector>) {
        // Box<dyn Connector> keeps the connector, so count through an Arc
        // shared with the test.
        struct Shared(Arc<PagedConnector>);
        #[async_trait]
        impl Connector for Shared {
            async fn connect(&self, target: &str) -> Result<Arc<dyn Connection>, ExecutorError> {
                self.0.connect(target).await
            }
        }
        let connector = Arc::new(PagedConnector {
            connects: AtomicUsize::new(0),
        });
        let executor = QueryExecutor::new(
            Box::new(Shared(Arc::clone(&connector))),
            Duration::ZERO,
        );
        (executor, connector)
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_connecting() {
        let (executor, connector) = paged_executor();
        let err = executor
            .submit("proj", "   ", CancellationToken::new())
            .await
            .expect_err("empty query must fail");
        assert!(matches!(err, ExecutorError::Query(_)));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn connections_are_cached_per_target() {
        let (executor, connector) = paged_executor();
        for _ in 0..3 {
            executor
                .submit("proj-a", "SELECT 1", CancellationToken::new())
                .await
                .unwrap();
        }
        executor
            .submit("proj-b", "SELECT 1", CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn collect_stops_at_cap_without_fetching_further_pages() {
        let (executor, _) = paged_executor();
        let stream = executor
            .submit("proj", "SELECT 1", CancellationToken::new())
            .await
            .unwrap();
        let results = stream.collect(2).await.unwrap();
        assert_eq!(results.row_count(), 2);
        assert!(results.truncated);
    }

    #[tokio::test]
    async fn collect_drains_all_pages_when_uncapped() {
        let (executor, _) = paged_executor();
        let stream = executor
            .submit("proj", "SELECT 1", CancellationToken::new())
            .await
            .unwrap();
        let results = stream.collect(0).await.unwrap();
        assert_eq!(results.row_count(), 9);
        assert!(!results.truncated);
        assert_eq!(results.rows[8].values[0], Value::Integer(8));
    }

    #[tokio::test]
    async fn cancelled_token_unblocks_a_stalled_call() {
        struct StallingConnection;
        #[async_trait]
        impl Connection for StallingConnection {
            async fn run_query(&self, _text: &str) -> Result<QueryPage, ExecutorError> {
                std::future::pending().await
            }
            async fn next_page(&self, _token: &str) -> Result<QueryPage, ExecutorError> {
                std::future::pending().await
            }
            async fn close(&self) -> Result<(), ExecutorError> {
                Ok(())
            }
        }
        struct StallingConnector;
        #[async_trait]
        impl Connector for StallingConnector {
            async fn connect(&self, _target: &str) -> Result<Arc<dyn Connection>, ExecutorError> {
                Ok(Arc::new(StallingConnection))
            }
        }

        let executor = QueryExecutor::new(Box::new(StallingConnector), Duration::ZERO);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = executor
            .submit("proj", "SELECT 1", cancel)
            .await
            .expect_err("cancelled token must unblock");
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn stalled_call_times_out_when_a_limit_is_set() {
        struct StallingConnection;
        #[async_trait]
        impl Connection for StallingConnection {
            async fn run_query(&self, _text: &str) -> Result<QueryPage, ExecutorError> {
                std::future::pending().await
            }
            async fn next_page(&self, _token: &str) -> Result<QueryPage, ExecutorError> {
                std::future::pending().await
            }
            async fn close(&self) -> Result<(), ExecutorError> {
                Ok(())
            }
        }
        struct StallingConnector;
        #[async_trait]
        impl Connector for StallingConnector {
            async fn connect(&self, _target: &str) -> Result<Arc<dyn Connection>, ExecutorError> {
                Ok(Arc::new(StallingConnection))
            }
        }

        let executor =
            QueryExecutor::new(Box::new(StallingConnector), Duration::from_millis(10));
        let err = executor
            .submit("proj", "SELECT 1", CancellationToken::new())
            .await
            .expect_err("stalled call must time out");
        assert!(matches!(err, ExecutorError::Timeout(_)));
    }

    #[tokio::test]
    async fn close_aggregates_every_failure() {
        struct FailingConnection {
            target: String,
        }
        #[async_trait]
        impl Connection for FailingConnection {
            async fn run_query(&self, _text: &str) -> Result<QueryPage, ExecutorError> {
                Ok(QueryPage::default())
            }
            async fn next_page(&self, _token: &str) -> Result<QueryPage, ExecutorError> {
                Ok(QueryPage::default())
            }
            async fn close(&self) -> Result<(), ExecutorError> {
                if self.target == "healthy" {
                    Ok(())
                } else {
                    Err(ExecutorError::Connection {
                        target: self.target.clone(),
                        message: "socket gone".to_string(),
                    })
                }
            }
        }
        struct FailingConnector;
        #[async_trait]
        impl Connector for FailingConnector {
            async fn connect(&self, target: &str) -> Result<Arc<dyn Connection>, ExecutorError> {
                Ok(Arc::new(FailingConnection {
                    target: target.to_string(),
                }))
            }
        }

        let executor = QueryExecutor::new(Box::new(FailingConnector), Duration::ZERO);
        for target in ["healthy", "broken-1", "broken-2"] {
            executor
                .submit(target, "SELECT 1", CancellationToken::new())
                .await
                .unwrap();
        }
        let err = executor.close().await.expect_err("close must aggregate");
        match err {
            ExecutorError::Close { failures, total } => {
                assert_eq!(total, 3);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("expected Close, got {other:?}"),
        }
    }
}
