//! Async query continuation
//!
//! Same traversal rules as the blocking iterators in
//! [`continuation`](super::continuation), expressed as `futures` streams:
//! one request per page, issued only when the stream is polled past the
//! items already received, and nothing after the first error.

use futures::stream::{self, Stream, TryStreamExt};
use std::fmt;
use std::ops::Deref;
use tracing::{debug, info};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::query::{Query, QueryContext};
use crate::service::AsyncQueryService;

use super::page::{IntoWithCursor, ResultPage};

/// Async counterpart of [`Continuation`](super::Continuation)
pub struct AsyncContinuation<'s, S: ?Sized> {
    service: &'s S,
    context: QueryContext,
    request_limit: Option<usize>,
}

impl<'s, S: AsyncQueryService + ?Sized> AsyncContinuation<'s, S> {
    pub fn new(service: &'s S, context: QueryContext) -> Self {
        Self {
            service,
            context,
            request_limit: None,
        }
    }

    /// Cap the follow-up requests each stream may issue (`Some(0)`: current
    /// page only)
    pub fn with_request_limit(mut self, limit: Option<usize>) -> Self {
        self.request_limit = limit;
        self
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Run `query` and return the first page of its results
    pub async fn run(&self, query: Query) -> Result<ResultPage<S::Item>> {
        self.fetch(query).await
    }

    pub fn has_next(&self, page: &ResultPage<S::Item>) -> bool {
        page.can_continue()
    }

    /// Fetch the page after `page`; fails without a request when there is none
    pub async fn next(&self, page: &ResultPage<S::Item>) -> Result<ResultPage<S::Item>> {
        let query = page.continuation_query()?;
        self.fetch(query).await
    }

    /// Stream of every item from `page` onwards
    pub fn all(
        &self,
        page: ResultPage<S::Item>,
    ) -> impl Stream<Item = Result<S::Item>> + Send + use<'s, S> {
        self.all_with_cursor(page).map_ok(|(item, _)| item)
    }

    /// Stream of every `(item, cursor)` pair from `page` onwards
    pub fn all_with_cursor(
        &self,
        page: ResultPage<S::Item>,
    ) -> impl Stream<Item = Result<(S::Item, Cursor)>> + Send + use<'s, S> {
        let state = StreamState {
            pending: page.continuation_query().ok(),
            buffer: page.into_iter_with_cursor(),
            requests_remaining: self.request_limit,
            continuation: self.clone(),
            pages_fetched: 0,
        };

        stream::try_unfold(state, |mut state| async move {
            loop {
                if let Some(pair) = state.buffer.next() {
                    return Ok(Some((pair, state)));
                }

                let Some(query) = state.pending.take() else {
                    info!(
                        "Query stream finished after {} follow-up request(s)",
                        state.pages_fetched
                    );
                    return Ok(None);
                };

                if let Some(remaining) = state.requests_remaining.as_mut() {
                    if *remaining == 0 {
                        info!("Query stream reached its request limit");
                        return Ok(None);
                    }
                    *remaining -= 1;
                }

                let page = match state.continuation.fetch(query).await {
                    Ok(page) => page,
                    Err(e) => return Err(e),
                };
                state.pages_fetched += 1;
                state.pending = page.continuation_query().ok();
                state.buffer = page.into_iter_with_cursor();
            }
        })
    }

    async fn fetch(&self, query: Query) -> Result<ResultPage<S::Item>> {
        debug!(
            "Running query on kinds {:?} (start cursor: {})",
            query.kinds,
            query
                .start_cursor
                .as_ref()
                .map_or_else(|| "none".to_string(), Cursor::to_string)
        );

        let batch = self.service.run_query(&self.context, &query).await?;

        debug!(
            "Received {} result(s), more results: {}",
            batch.results.len(),
            batch.more_results
        );

        Ok(ResultPage::from_batch(batch, query))
    }
}

impl<S: ?Sized> Clone for AsyncContinuation<'_, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service,
            context: self.context.clone(),
            request_limit: self.request_limit,
        }
    }
}

impl<S: ?Sized> fmt::Debug for AsyncContinuation<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncContinuation")
            .field("context", &self.context)
            .field("request_limit", &self.request_limit)
            .field("service", &"<AsyncQueryService>")
            .finish()
    }
}

struct StreamState<'s, S: AsyncQueryService + ?Sized> {
    continuation: AsyncContinuation<'s, S>,
    buffer: IntoWithCursor<S::Item>,
    pending: Option<Query>,
    requests_remaining: Option<usize>,
    pages_fetched: usize,
}

/// A result page together with the async driver that can continue it
pub struct AsyncQueryResults<'s, S: AsyncQueryService + ?Sized> {
    page: ResultPage<S::Item>,
    continuation: AsyncContinuation<'s, S>,
}

impl<'s, S: AsyncQueryService + ?Sized> AsyncQueryResults<'s, S> {
    pub fn new(page: ResultPage<S::Item>, continuation: AsyncContinuation<'s, S>) -> Self {
        Self { page, continuation }
    }

    pub fn page(&self) -> &ResultPage<S::Item> {
        &self.page
    }

    pub fn into_page(self) -> ResultPage<S::Item> {
        self.page
    }

    pub fn has_next(&self) -> bool {
        self.continuation.has_next(&self.page)
    }

    pub async fn next(&self) -> Result<AsyncQueryResults<'s, S>> {
        let page = self.continuation.next(&self.page).await?;
        Ok(AsyncQueryResults {
            page,
            continuation: self.continuation.clone(),
        })
    }

    pub fn all(self) -> impl Stream<Item = Result<S::Item>> + Send + use<'s, S> {
        self.continuation.all(self.page)
    }

    pub fn all_with_cursor(
        self,
    ) -> impl Stream<Item = Result<(S::Item, Cursor)>> + Send + use<'s, S> {
        self.continuation.all_with_cursor(self.page)
    }
}

impl<S: AsyncQueryService + ?Sized> Deref for AsyncQueryResults<'_, S> {
    type Target = ResultPage<S::Item>;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}

impl<S> fmt::Debug for AsyncQueryResults<'_, S>
where
    S: AsyncQueryService + ?Sized,
    S::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncQueryResults")
            .field("page", &self.page)
            .field("continuation", &self.continuation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::entity::{Entity, Key};
    use crate::error::DatastoreError;
    use crate::results::MoreResults;
    use crate::service::{EntityResult, QueryBatch};

    // Replays canned responses in order and records every query it was sent.
    struct ScriptedService {
        responses: Mutex<VecDeque<Result<QueryBatch<Entity>>>>,
        requests: Mutex<Vec<Query>>,
    }

    impl ScriptedService {
        fn new(responses: Vec<Result<QueryBatch<Entity>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Query> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AsyncQueryService for ScriptedService {
        type Item = Entity;

        async fn run_query(
            &self,
            _context: &QueryContext,
            query: &Query,
        ) -> Result<QueryBatch<Entity>> {
            self.requests.lock().unwrap().push(query.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected run_query call")
        }
    }

    fn batch(page: i64, status: MoreResults, end: Option<&str>) -> QueryBatch<Entity> {
        let results = (0..25)
            .map(|i| {
                EntityResult::new(
                    Entity::with_key(Key::with_id("ds-test", page * 1000 + i)),
                    Cursor::from(format!("result-cursor-{page}-{i}").as_str()),
                )
            })
            .collect();
        let mut batch = QueryBatch::new(results, status);
        batch.end_cursor = end.map(Cursor::from);
        batch
    }

    fn two_pages() -> ScriptedService {
        ScriptedService::new(vec![
            Ok(batch(1, MoreResults::NotFinished, Some("second-page-cursor"))),
            Ok(batch(2, MoreResults::NoMoreResults, None)),
        ])
    }

    #[tokio::test]
    async fn test_stream_all_fetches_both_pages() {
        let service = two_pages();
        let continuation = AsyncContinuation::new(&service, QueryContext::new("my-todo-project"));
        let first = continuation.run(Query::new().kind("Task")).await.unwrap();

        let keys: Vec<Key> = continuation
            .all(first)
            .map_ok(|entity| entity.key.unwrap())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(keys.len(), 50);
        assert_eq!(keys[0], Key::with_id("ds-test", 1000));
        assert_eq!(keys[49], Key::with_id("ds-test", 2024));

        let requests = service.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1],
            Query::new().kind("Task").start(Cursor::from("second-page-cursor"))
        );
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let service = two_pages();
        let continuation = AsyncContinuation::new(&service, QueryContext::new("p"));
        let first = continuation.run(Query::new().kind("Task")).await.unwrap();

        let taken: Vec<_> = continuation.all_with_cursor(first).take(25).collect().await;
        assert_eq!(taken.len(), 25);
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_request_limit() {
        let service = two_pages();
        let continuation =
            AsyncContinuation::new(&service, QueryContext::new("p")).with_request_limit(Some(0));
        let first = continuation.run(Query::new().kind("Task")).await.unwrap();

        let count = continuation.all(first).count().await;
        assert_eq!(count, 25);
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_stops_after_transport_error() {
        let service = ScriptedService::new(vec![
            Ok(batch(1, MoreResults::NotFinished, Some("second-page-cursor"))),
            Err(DatastoreError::transport("UNAVAILABLE")),
        ]);
        let continuation = AsyncContinuation::new(&service, QueryContext::new("p"));
        let first = continuation.run(Query::new().kind("Task")).await.unwrap();

        let results: Vec<_> = continuation.all(first).collect().await;
        assert_eq!(results.len(), 26);
        assert!(results[..25].iter().all(|r| r.is_ok()));
        assert!(results[25].as_ref().unwrap_err().is_transport());
    }

    #[test]
    fn test_async_results_pagination() {
        tokio_test::block_on(async {
            let service = two_pages();
            let continuation = AsyncContinuation::new(&service, QueryContext::new("p"));
            let page = continuation.run(Query::new().kind("Task")).await.unwrap();
            let first = AsyncQueryResults::new(page, continuation);

            assert!(first.has_next());
            assert_eq!(
                first.cursor_for(first.first().unwrap()).unwrap(),
                &Cursor::from("result-cursor-1-0")
            );

            let second = first.next().await.unwrap();
            assert!(!second.has_next());
            assert!(second.is_exhausted());

            let err = second.next().await.unwrap_err();
            assert!(err.is_illegal_continuation());
            assert_eq!(service.requests().len(), 2);
        });
    }
}
