//! Query references
//!
//! A [`Query`] describes what to ask the service for. This crate never
//! interprets filters or orders; it only clones a query and moves its start
//! cursor (and remaining offset) forward when continuing to the next page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ProjectConfig;
use crate::cursor::Cursor;

/// Project and namespace a query runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl QueryContext {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn from_config(project: &ProjectConfig) -> Self {
        Self {
            project_id: project.project_id.clone(),
            namespace: project.namespace.clone(),
        }
    }
}

/// Comparison applied by a property filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    In,
    NotIn,
    HasAncestor,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub property: String,
    pub operator: FilterOperator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOrder {
    pub property: String,
    pub direction: Direction,
}

/// A query to run against the service
///
/// Builder methods consume and return the query, so a query is never
/// changed behind the back of someone holding a clone.
///
/// # Example
///
/// ```rust
/// use datastore_results::query::{Direction, FilterOperator, Query};
///
/// let query = Query::new()
///     .kind("Task")
///     .filter("done", FilterOperator::Equal, false)
///     .order("priority", Direction::Descending)
///     .limit(10);
///
/// assert_eq!(query.kinds, vec!["Task".to_string()]);
/// assert_eq!(query.limit, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub kinds: Vec<String>,

    #[serde(default)]
    pub filters: Vec<PropertyFilter>,

    #[serde(default)]
    pub orders: Vec<PropertyOrder>,

    #[serde(default)]
    pub projection: Vec<String>,

    #[serde(default)]
    pub distinct_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(default)]
    pub offset: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<Cursor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<Cursor>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kinds.push(kind.into());
        self
    }

    pub fn filter(
        mut self,
        property: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(PropertyFilter {
            property: property.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(PropertyOrder {
            property: property.into(),
            direction,
        });
        self
    }

    pub fn select(mut self, property: impl Into<String>) -> Self {
        self.projection.push(property.into());
        self
    }

    pub fn distinct_on(mut self, property: impl Into<String>) -> Self {
        self.distinct_on.push(property.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Resume results at `cursor`
    pub fn start(mut self, cursor: Cursor) -> Self {
        self.start_cursor = Some(cursor);
        self
    }

    /// Stop results at `cursor`
    pub fn end(mut self, cursor: Cursor) -> Self {
        self.end_cursor = Some(cursor);
        self
    }

    /// Derive the query that picks up where a batch left off
    ///
    /// The start cursor moves to `end_cursor`, and whatever part of the
    /// offset the service already skipped is not applied again. Everything
    /// else, limit included, is carried over unchanged.
    pub(crate) fn continue_from(&self, end_cursor: Cursor, skipped_results: u32) -> Self {
        let mut next = self.clone();
        next.start_cursor = Some(end_cursor);
        next.offset = self.offset.saturating_sub(skipped_results);
        next
    }
}
