//! Datastore query result pagination
//!
//! This library turns the bounded batches returned by a Datastore-style
//! query service into pages that know the cursor of every result, and into
//! lazy iterators that keep fetching pages for as long as the consumer keeps
//! reading.
//!
//! # Modules
//!
//! - `config`: Configuration management
//! - `cursor`: Opaque query cursors
//! - `dataset`: Running queries in a project context
//! - `entity`: Keys and entities, the default result type
//! - `error`: Error types and handling
//! - `logging`: Logging setup
//! - `query`: Query references and contexts
//! - `results`: Result pages, continuation, and cross-page iteration
//! - `service`: The query service boundary
//!
//! # Example
//!
//! ```no_run
//! use datastore_results::prelude::*;
//!
//! fn count_tasks<S: QueryService<Item = Entity>>(service: S) -> Result<usize> {
//!     let config = Config::load()?;
//!     let dataset = Dataset::from_config(service, &config)?;
//!
//!     let results = dataset.run(dataset.query("Task"))?;
//!     let mut count = 0;
//!     for entity in results.all() {
//!         entity?;
//!         count += 1;
//!     }
//!     Ok(count)
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod dataset;
pub mod entity;
pub mod error;
pub mod logging;
pub mod query;
pub mod results;
pub mod service;

// Re-export commonly used types
pub use config::Config;
pub use cursor::Cursor;
pub use dataset::{AsyncDataset, Dataset};
pub use entity::{Entity, Key};
pub use error::{DatastoreError, Result};
pub use query::{Query, QueryContext};
pub use results::{MoreResults, QueryResults, ResultPage};
pub use service::{AsyncQueryService, QueryBatch, QueryService};

/// Everything needed to implement a service and page through its results
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::cursor::Cursor;
    pub use crate::dataset::{AsyncDataset, Dataset};
    pub use crate::entity::{Entity, Key, KeyId};
    pub use crate::error::{DatastoreError, Result};
    pub use crate::query::{Direction, FilterOperator, Query, QueryContext};
    pub use crate::results::{
        AsyncContinuation, AsyncQueryResults, Continuation, MoreResults, QueryResults, ResultPage,
    };
    pub use crate::service::{AsyncQueryService, EntityResult, QueryBatch, QueryService};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
