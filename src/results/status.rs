use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DatastoreError;

/// Why a result batch ended, and whether asking again can yield more
///
/// Exactly one of the `is_*` / `has_*` predicates is true for each value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoreResults {
    /// The service cut the batch short; continuing will return more.
    NotFinished,

    /// The query limit was reached; more results exist past it.
    MoreResultsAfterLimit,

    /// The query end cursor was reached; more results exist past it.
    MoreResultsAfterCursor,

    /// Nothing left.
    NoMoreResults,
}

impl MoreResults {
    pub fn is_not_finished(self) -> bool {
        matches!(self, MoreResults::NotFinished)
    }

    pub fn has_more_after_limit(self) -> bool {
        matches!(self, MoreResults::MoreResultsAfterLimit)
    }

    pub fn has_more_after_cursor(self) -> bool {
        matches!(self, MoreResults::MoreResultsAfterCursor)
    }

    pub fn is_exhausted(self) -> bool {
        matches!(self, MoreResults::NoMoreResults)
    }

    /// True when a follow-up request may return more items
    pub fn is_continuable(self) -> bool {
        !self.is_exhausted()
    }

    /// Wire name of the status
    pub fn as_str(self) -> &'static str {
        match self {
            MoreResults::NotFinished => "NOT_FINISHED",
            MoreResults::MoreResultsAfterLimit => "MORE_RESULTS_AFTER_LIMIT",
            MoreResults::MoreResultsAfterCursor => "MORE_RESULTS_AFTER_CURSOR",
            MoreResults::NoMoreResults => "NO_MORE_RESULTS",
        }
    }
}

impl fmt::Display for MoreResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoreResults {
    type Err = DatastoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_FINISHED" => Ok(MoreResults::NotFinished),
            "MORE_RESULTS_AFTER_LIMIT" => Ok(MoreResults::MoreResultsAfterLimit),
            "MORE_RESULTS_AFTER_CURSOR" => Ok(MoreResults::MoreResultsAfterCursor),
            "NO_MORE_RESULTS" => Ok(MoreResults::NoMoreResults),
            other => Err(DatastoreError::Generic(format!(
                "Unknown more results status: {other}"
            ))),
        }
    }
}
