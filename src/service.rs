//! Query service boundary
//!
//! The only thing this crate needs from the RPC layer is "run this query
//! and give me one batch". Transport, authentication, and wire decoding live
//! behind [`QueryService`] (blocking) or [`AsyncQueryService`].
//!
//! Implementations report their own failures with
//! [`DatastoreError::transport`](crate::error::DatastoreError::transport);
//! this crate passes them through to the caller unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cursor::Cursor;
use crate::entity::Entity;
use crate::error::Result;
use crate::query::{Query, QueryContext};
use crate::results::MoreResults;

/// One decoded result and the cursor pointing just past it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult<T = Entity> {
    pub item: T,

    #[serde(default)]
    pub cursor: Cursor,
}

impl<T> EntityResult<T> {
    pub fn new(item: T, cursor: Cursor) -> Self {
        Self { item, cursor }
    }
}

/// One bounded response from the query service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBatch<T = Entity> {
    pub results: Vec<EntityResult<T>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<Cursor>,

    pub more_results: MoreResults,

    /// Results skipped to satisfy the query offset
    #[serde(default)]
    pub skipped_results: u32,
}

impl<T> QueryBatch<T> {
    pub fn new(results: Vec<EntityResult<T>>, more_results: MoreResults) -> Self {
        Self {
            results,
            end_cursor: None,
            more_results,
            skipped_results: 0,
        }
    }

    pub fn with_end_cursor(mut self, cursor: Cursor) -> Self {
        self.end_cursor = Some(cursor);
        self
    }

    pub fn with_skipped_results(mut self, skipped: u32) -> Self {
        self.skipped_results = skipped;
        self
    }
}

/// Blocking query execution
pub trait QueryService {
    /// Decoded result type
    type Item;

    /// Run `query` in `context` and return one batch
    ///
    /// # Arguments
    /// * `context` - Project and namespace to run in
    /// * `query` - Query to run, possibly carrying a start cursor
    ///
    /// # Returns
    /// * `Result<QueryBatch<Self::Item>>` - One batch, or a transport error
    fn run_query(&self, context: &QueryContext, query: &Query) -> Result<QueryBatch<Self::Item>>;
}

impl<S: QueryService + ?Sized> QueryService for &S {
    type Item = S::Item;

    fn run_query(&self, context: &QueryContext, query: &Query) -> Result<QueryBatch<Self::Item>> {
        (**self).run_query(context, query)
    }
}

impl<S: QueryService + ?Sized> QueryService for Box<S> {
    type Item = S::Item;

    fn run_query(&self, context: &QueryContext, query: &Query) -> Result<QueryBatch<Self::Item>> {
        (**self).run_query(context, query)
    }
}

impl<S: QueryService + ?Sized> QueryService for Arc<S> {
    type Item = S::Item;

    fn run_query(&self, context: &QueryContext, query: &Query) -> Result<QueryBatch<Self::Item>> {
        (**self).run_query(context, query)
    }
}

/// Async query execution
#[async_trait]
pub trait AsyncQueryService: Send + Sync {
    /// Decoded result type
    type Item: Send;

    /// Run `query` in `context` and return one batch
    async fn run_query(
        &self,
        context: &QueryContext,
        query: &Query,
    ) -> Result<QueryBatch<Self::Item>>;
}

#[async_trait]
impl<S: AsyncQueryService + ?Sized> AsyncQueryService for Arc<S> {
    type Item = S::Item;

    async fn run_query(
        &self,
        context: &QueryContext,
        query: &Query,
    ) -> Result<QueryBatch<Self::Item>> {
        (**self).run_query(context, query).await
    }
}
