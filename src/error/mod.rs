//! Error handling for query result pagination.
//!
//! This module provides:
//! - A single crate-wide error type, [`DatastoreError`]
//! - Specific error kinds for cursor lookups and continuations
//! - An opaque [`TransportError`] that carries query service failures unchanged
//!
//! # Example
//!
//! ```rust
//! use datastore_results::error::{ContinuationError, DatastoreError, Result};
//!
//! fn continue_paging(done: bool) -> Result<()> {
//!     if done {
//!         return Err(ContinuationError::NoMoreResults.into());
//!     }
//!     Ok(())
//! }
//!
//! let err = continue_paging(true).unwrap_err();
//! assert!(err.is_illegal_continuation());
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{
    ConfigError, ContinuationError, CursorError, DatastoreError, Result, TransportError,
};
