//! Paginated query results
//!
//! This module turns service batches into pages and pages into streams of
//! results:
//! - `status`: why a batch ended ([`MoreResults`])
//! - `page`: one batch of items with a cursor per item ([`ResultPage`])
//! - `continuation`: blocking driver and cross-page iterators
//! - `stream`: the same over [`AsyncQueryService`](crate::service::AsyncQueryService)
//!
//! # Example
//!
//! ```rust
//! use datastore_results::prelude::*;
//!
//! struct OnePage;
//!
//! impl QueryService for OnePage {
//!     type Item = Entity;
//!
//!     fn run_query(&self, _ctx: &QueryContext, _query: &Query) -> Result<QueryBatch> {
//!         let results = vec![EntityResult::new(
//!             Entity::with_key(Key::with_id("Task", 1)),
//!             Cursor::from("c1"),
//!         )];
//!         Ok(QueryBatch::new(results, MoreResults::NoMoreResults))
//!     }
//! }
//!
//! let continuation = Continuation::new(&OnePage, QueryContext::new("my-project"));
//! let page = continuation.run(Query::new().kind("Task")).unwrap();
//!
//! assert!(!continuation.has_next(&page));
//! assert_eq!(page.cursor_for(page.first().unwrap()).unwrap(), &Cursor::from("c1"));
//! assert_eq!(continuation.all(page).count(), 1);
//! ```

pub mod continuation;
pub mod page;
pub mod status;
pub mod stream;

#[cfg(test)]
mod tests;

pub use continuation::{All, AllWithCursor, Continuation, QueryResults};
pub use page::{IntoWithCursor, ResultPage, WithCursor};
pub use status::MoreResults;
pub use stream::{AsyncContinuation, AsyncQueryResults};
