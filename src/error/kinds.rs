use std::{error::Error as StdError, fmt, io};

use crate::results::MoreResults;

/// Crate-wide `Result` type using [`DatastoreError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, DatastoreError>;

/// Top-level error type for query result pagination.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum DatastoreError {
    /// Cursor lookup or decoding errors.
    Cursor(CursorError),

    /// A continuation was requested that the page cannot provide.
    Continuation(ContinuationError),

    /// Failure raised by the query service while running a query.
    Transport(TransportError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Cursor-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// The item passed to `cursor_for` is not one of the page's own items.
    NotInPage { page_len: usize },

    /// A cursor string was not valid base64.
    InvalidEncoding(String),
}

/// Continuation-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationError {
    /// The service reported that there are no more results.
    NoMoreResults,

    /// The service reported more results but sent no end cursor to resume from.
    MissingEndCursor(MoreResults),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// Opaque failure reported by a query service.
///
/// The wrapped error is kept as-is; use [`StdError::source`] or
/// [`TransportError::into_inner`] to get at it.
pub struct TransportError {
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl TransportError {
    /// Wrap a service error
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self { inner: err.into() }
    }

    /// Borrow the service error
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    /// Take back the service error
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.inner
    }
}

impl DatastoreError {
    /// Build a transport error from any service error
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        DatastoreError::Transport(TransportError::new(err))
    }

    /// True for `cursor_for` lookups of items that are not in the page
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatastoreError::Cursor(CursorError::NotInPage { .. }))
    }

    /// True when a continuation was requested from a page that has none
    pub fn is_illegal_continuation(&self) -> bool {
        matches!(self, DatastoreError::Continuation(_))
    }

    /// True for failures raised by the query service
    pub fn is_transport(&self) -> bool {
        matches!(self, DatastoreError::Transport(_))
    }
}

/* ========================= Display implementations ========================= */

impl fmt::Display for DatastoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatastoreError::Cursor(e) => write!(f, "Cursor error: {e}"),
            DatastoreError::Continuation(e) => write!(f, "Illegal continuation: {e}"),
            DatastoreError::Transport(e) => write!(f, "Query service error: {e}"),
            DatastoreError::Config(e) => write!(f, "Configuration error: {e}"),
            DatastoreError::Io(e) => write!(f, "I/O error: {e}"),
            DatastoreError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::NotInPage { page_len } => {
                write!(f, "item does not belong to this page of {page_len} result(s)")
            }
            CursorError::InvalidEncoding(msg) => write!(f, "invalid cursor encoding: {msg}"),
        }
    }
}

impl fmt::Display for ContinuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinuationError::NoMoreResults => write!(f, "there are no more results"),
            ContinuationError::MissingEndCursor(status) => {
                write!(f, "batch ended with {status} but carried no end cursor")
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransportError").field(&self.inner).finish()
    }
}

impl StdError for DatastoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DatastoreError::Transport(e) => Some(e),
            DatastoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl StdError for CursorError {}
impl StdError for ContinuationError {}
impl StdError for ConfigError {}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref())
    }
}

/* ========================= Conversions to DatastoreError ========================= */

impl From<io::Error> for DatastoreError {
    fn from(err: io::Error) -> Self {
        DatastoreError::Io(err)
    }
}

impl From<CursorError> for DatastoreError {
    fn from(err: CursorError) -> Self {
        DatastoreError::Cursor(err)
    }
}

impl From<ContinuationError> for DatastoreError {
    fn from(err: ContinuationError) -> Self {
        DatastoreError::Continuation(err)
    }
}

impl From<TransportError> for DatastoreError {
    fn from(err: TransportError) -> Self {
        DatastoreError::Transport(err)
    }
}

impl From<ConfigError> for DatastoreError {
    fn from(err: ConfigError) -> Self {
        DatastoreError::Config(err)
    }
}

impl From<String> for DatastoreError {
    fn from(msg: String) -> Self {
        DatastoreError::Generic(msg)
    }
}

impl From<&str> for DatastoreError {
    fn from(msg: &str) -> Self {
        DatastoreError::Generic(msg.to_owned())
    }
}
