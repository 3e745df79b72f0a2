//! Continuing a query past its first page
//!
//! [`Continuation`] turns a page's end cursor into the next request. [`All`]
//! and [`AllWithCursor`] flatten a page and everything after it into one
//! iterator, fetching each further page only when the consumer asks for an
//! item past the ones already received.
//!
//! The cross-page iterators are single-pass: they own the page they start
//! from and issue requests as they go, so the only way to traverse again is
//! to run the query again.

use std::fmt;
use std::iter::FusedIterator;
use std::ops::Deref;
use tracing::{debug, info};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::query::{Query, QueryContext};
use crate::service::QueryService;

use super::page::{IntoWithCursor, ResultPage};

/// Fetches the pages that follow a [`ResultPage`]
pub struct Continuation<'s, S: ?Sized> {
    service: &'s S,
    context: QueryContext,
}

impl<'s, S: QueryService + ?Sized> Continuation<'s, S> {
    /// Create a driver that sends requests to `service` in `context`
    pub fn new(service: &'s S, context: QueryContext) -> Self {
        Self { service, context }
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Run `query` and return the first page of its results
    pub fn run(&self, query: Query) -> Result<ResultPage<S::Item>> {
        self.fetch(query)
    }

    /// True when [`next`](Self::next) can be called for `page`
    pub fn has_next(&self, page: &ResultPage<S::Item>) -> bool {
        page.can_continue()
    }

    /// Fetch the page after `page`
    ///
    /// Issues exactly one request, whose start cursor is `page`'s end cursor.
    ///
    /// # Returns
    /// * `Result<ResultPage<S::Item>>` - The next page; `ContinuationError`
    ///   without any request when `page` cannot be continued; the service's
    ///   own error if the request fails
    pub fn next(&self, page: &ResultPage<S::Item>) -> Result<ResultPage<S::Item>> {
        let query = page.continuation_query()?;
        self.fetch(query)
    }

    /// Every item from `page` onwards, across pages
    pub fn all(&self, page: ResultPage<S::Item>) -> All<'s, S> {
        All {
            traversal: Traversal::new(self.clone(), page),
        }
    }

    /// Every `(item, cursor)` pair from `page` onwards, across pages
    pub fn all_with_cursor(&self, page: ResultPage<S::Item>) -> AllWithCursor<'s, S> {
        AllWithCursor {
            traversal: Traversal::new(self.clone(), page),
        }
    }

    fn fetch(&self, query: Query) -> Result<ResultPage<S::Item>> {
        debug!(
            "Running query on kinds {:?} (start cursor: {})",
            query.kinds,
            query
                .start_cursor
                .as_ref()
                .map_or_else(|| "none".to_string(), Cursor::to_string)
        );

        let batch = self.service.run_query(&self.context, &query)?;

        debug!(
            "Received {} result(s), more results: {}",
            batch.results.len(),
            batch.more_results
        );

        Ok(ResultPage::from_batch(batch, query))
    }
}

impl<S: ?Sized> Clone for Continuation<'_, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service,
            context: self.context.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Continuation<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("context", &self.context)
            .field("service", &"<QueryService>")
            .finish()
    }
}

/// State shared by the cross-page iterators
struct Traversal<'s, S: QueryService + ?Sized> {
    continuation: Continuation<'s, S>,
    buffer: IntoWithCursor<S::Item>,
    pending: Option<Query>,
    requests_remaining: Option<usize>,
    pages_fetched: usize,
    yielded: usize,
    finished: bool,
}

impl<'s, S: QueryService + ?Sized> Traversal<'s, S> {
    fn new(continuation: Continuation<'s, S>, page: ResultPage<S::Item>) -> Self {
        let pending = page.continuation_query().ok();
        Self {
            continuation,
            buffer: page.into_iter_with_cursor(),
            pending,
            requests_remaining: None,
            pages_fetched: 0,
            yielded: 0,
            finished: false,
        }
    }

    fn next_pair(&mut self) -> Option<Result<(S::Item, Cursor)>> {
        loop {
            if let Some(pair) = self.buffer.next() {
                self.yielded += 1;
                return Some(Ok(pair));
            }

            let Some(query) = self.pending.take() else {
                self.finish("no more results");
                return None;
            };

            if let Some(remaining) = self.requests_remaining.as_mut() {
                if *remaining == 0 {
                    self.finish("request limit reached");
                    return None;
                }
                *remaining -= 1;
            }

            match self.continuation.fetch(query) {
                Ok(page) => {
                    self.pages_fetched += 1;
                    self.pending = page.continuation_query().ok();
                    self.buffer = page.into_iter_with_cursor();
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }

    fn finish(&mut self, reason: &str) {
        if !self.finished {
            self.finished = true;
            info!(
                "Query traversal finished ({reason}) after {} result(s) and {} follow-up request(s)",
                self.yielded, self.pages_fetched
            );
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = self.buffer.len();
        if self.pending.is_some() {
            (buffered, None)
        } else {
            (buffered, Some(buffered))
        }
    }
}

/// Lazy, single-pass iterator over every item from a page onwards
///
/// Yields `Err` once if a follow-up request fails, then ends.
pub struct All<'s, S: QueryService + ?Sized> {
    traversal: Traversal<'s, S>,
}

impl<S: QueryService + ?Sized> All<'_, S> {
    /// Issue at most `limit` follow-up requests (`0`: current page only)
    pub fn with_request_limit(mut self, limit: usize) -> Self {
        self.traversal.requests_remaining = Some(limit);
        self
    }

    /// Number of follow-up requests issued so far
    pub fn pages_fetched(&self) -> usize {
        self.traversal.pages_fetched
    }
}

impl<S: QueryService + ?Sized> Iterator for All<'_, S> {
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.traversal
            .next_pair()
            .map(|pair| pair.map(|(item, _)| item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.traversal.size_hint()
    }
}

impl<S: QueryService + ?Sized> FusedIterator for All<'_, S> {}

/// Lazy, single-pass iterator over every `(item, cursor)` pair from a page
/// onwards
///
/// Each cursor is the one the service sent with that item in its own batch.
pub struct AllWithCursor<'s, S: QueryService + ?Sized> {
    traversal: Traversal<'s, S>,
}

impl<S: QueryService + ?Sized> AllWithCursor<'_, S> {
    /// Issue at most `limit` follow-up requests (`0`: current page only)
    pub fn with_request_limit(mut self, limit: usize) -> Self {
        self.traversal.requests_remaining = Some(limit);
        self
    }

    /// Number of follow-up requests issued so far
    pub fn pages_fetched(&self) -> usize {
        self.traversal.pages_fetched
    }
}

impl<S: QueryService + ?Sized> Iterator for AllWithCursor<'_, S> {
    type Item = Result<(S::Item, Cursor)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.traversal.next_pair()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.traversal.size_hint()
    }
}

impl<S: QueryService + ?Sized> FusedIterator for AllWithCursor<'_, S> {}

/// A result page together with the driver that can continue it
///
/// Dereferences to [`ResultPage`], so cursor lookups, iteration, and status
/// predicates are available directly.
pub struct QueryResults<'s, S: QueryService + ?Sized> {
    page: ResultPage<S::Item>,
    continuation: Continuation<'s, S>,
    request_limit: Option<usize>,
}

impl<'s, S: QueryService + ?Sized> QueryResults<'s, S> {
    pub fn new(page: ResultPage<S::Item>, continuation: Continuation<'s, S>) -> Self {
        Self {
            page,
            continuation,
            request_limit: None,
        }
    }

    /// Default follow-up request limit for [`all`](Self::all) and
    /// [`all_with_cursor`](Self::all_with_cursor)
    pub fn with_request_limit(mut self, limit: Option<usize>) -> Self {
        self.request_limit = limit;
        self
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

    /// Fetch the next page; see [`Continuation::next`]
    pub fn next(&self) -> Result<QueryResults<'s, S>> {
        let page = self.continuation.next(&self.page)?;
        Ok(QueryResults {
            page,
            continuation: self.continuation.clone(),
            request_limit: self.request_limit,
        })
    }

    /// Every item from this page onwards; single-pass
    pub fn all(self) -> All<'s, S> {
        let all = self.continuation.all(self.page);
        match self.request_limit {
            Some(limit) => all.with_request_limit(limit),
            None => all,
        }
    }

    /// Every `(item, cursor)` pair from this page onwards; single-pass
    pub fn all_with_cursor(self) -> AllWithCursor<'s, S> {
        let all = self.continuation.all_with_cursor(self.page);
        match self.request_limit {
            Some(limit) => all.with_request_limit(limit),
            None => all,
        }
    }
}

impl<S: QueryService + ?Sized> Deref for QueryResults<'_, S> {
    type Target = ResultPage<S::Item>;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}

impl<S> fmt::Debug for QueryResults<'_, S>
where
    S: QueryService + ?Sized,
    S::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResults")
            .field("page", &self.page)
            .field("continuation", &self.continuation)
            .field("request_limit", &self.request_limit)
            .finish()
    }
}
