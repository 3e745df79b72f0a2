//! A single page of query results
//!
//! [`ResultPage`] keeps a batch's items and their cursors in two parallel
//! vectors. Cursor lookup goes by position, found by reference identity, so
//! two equal items in one page still map to their own cursors.

use std::ptr;
use std::slice;
use std::vec;
use tracing::warn;

use crate::cursor::Cursor;
use crate::entity::Entity;
use crate::error::{ContinuationError, CursorError, Result};
use crate::query::Query;
use crate::service::QueryBatch;

use super::status::MoreResults;

/// One immutable batch of results
#[derive(Debug, Clone)]
pub struct ResultPage<T = Entity> {
    items: Vec<T>,
    cursors: Vec<Cursor>,
    end_cursor: Option<Cursor>,
    more_results: MoreResults,
    skipped_results: u32,
    query: Query,
}

impl<T> ResultPage<T> {
    /// Build a page from a service batch and the query that produced it
    ///
    /// An end cursor is dropped when the batch says there are no more
    /// results, or when the service sent an empty one.
    pub fn from_batch(batch: QueryBatch<T>, query: Query) -> Self {
        let (items, cursors): (Vec<T>, Vec<Cursor>) = batch
            .results
            .into_iter()
            .map(|result| (result.item, result.cursor))
            .unzip();

        let end_cursor = match batch.more_results {
            MoreResults::NoMoreResults => None,
            _ => batch.end_cursor.filter(|cursor| !cursor.is_empty()),
        };

        if batch.more_results.is_continuable() && end_cursor.is_none() {
            warn!(
                "Batch of {} result(s) ended with {} but has no end cursor; it cannot be continued",
                items.len(),
                batch.more_results
            );
        }

        Self {
            items,
            cursors,
            end_cursor,
            more_results: batch.more_results,
            skipped_results: batch.skipped_results,
            query,
        }
    }

    /// Cursor recorded for `item`
    ///
    /// `item` must be borrowed from this page (e.g. from [`iter`](Self::iter)
    /// or [`first`](Self::first)); an equal value that lives elsewhere is
    /// not found.
    ///
    /// # Returns
    /// * `Result<&Cursor>` - The item's cursor, or `CursorError::NotInPage`
    pub fn cursor_for(&self, item: &T) -> Result<&Cursor> {
        self.position_of(item)
            .map(|index| &self.cursors[index])
            .ok_or_else(|| {
                CursorError::NotInPage {
                    page_len: self.items.len(),
                }
                .into()
            })
    }

    /// Cursor recorded for the item at `index`
    pub fn cursor_at(&self, index: usize) -> Option<&Cursor> {
        self.cursors.get(index)
    }

    fn position_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| ptr::eq(candidate, item))
    }

    /// Items in service order; can be called any number of times
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Items paired with their cursors
    pub fn iter_with_cursor(&self) -> WithCursor<'_, T> {
        WithCursor {
            inner: self.items.iter().zip(self.cursors.iter()),
        }
    }

    /// Owning variant of [`iter_with_cursor`](Self::iter_with_cursor)
    pub fn into_iter_with_cursor(self) -> IntoWithCursor<T> {
        IntoWithCursor {
            inner: self.items.into_iter().zip(self.cursors),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position just after the last item, if the results can go on
    pub fn end_cursor(&self) -> Option<&Cursor> {
        self.end_cursor.as_ref()
    }

    /// Alias for [`end_cursor`](Self::end_cursor)
    pub fn cursor(&self) -> Option<&Cursor> {
        self.end_cursor()
    }

    pub fn more_results(&self) -> MoreResults {
        self.more_results
    }

    pub fn skipped_results(&self) -> u32 {
        self.skipped_results
    }

    /// The query this page answers
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn is_not_finished(&self) -> bool {
        self.more_results.is_not_finished()
    }

    pub fn has_more_after_limit(&self) -> bool {
        self.more_results.has_more_after_limit()
    }

    pub fn has_more_after_cursor(&self) -> bool {
        self.more_results.has_more_after_cursor()
    }

    pub fn is_exhausted(&self) -> bool {
        self.more_results.is_exhausted()
    }

    /// True when a follow-up request may return more items
    pub fn can_continue(&self) -> bool {
        self.more_results.is_continuable() && self.end_cursor.is_some()
    }

    /// The query for the page after this one
    ///
    /// # Returns
    /// * `Result<Query>` - Continuation query, or `ContinuationError` when
    ///   the page cannot be continued
    pub fn continuation_query(&self) -> Result<Query> {
        match (&self.end_cursor, self.more_results) {
            (_, MoreResults::NoMoreResults) => Err(ContinuationError::NoMoreResults.into()),
            (None, status) => Err(ContinuationError::MissingEndCursor(status).into()),
            (Some(end_cursor), _) => Ok(self
                .query
                .continue_from(end_cursor.clone(), self.skipped_results)),
        }
    }
}

impl<'a, T> IntoIterator for &'a ResultPage<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for ResultPage<T> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Borrowing `(item, cursor)` iterator over one page
#[derive(Debug, Clone)]
pub struct WithCursor<'a, T> {
    inner: std::iter::Zip<slice::Iter<'a, T>, slice::Iter<'a, Cursor>>,
}

impl<'a, T> Iterator for WithCursor<'a, T> {
    type Item = (&'a T, &'a Cursor);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for WithCursor<'_, T> {}

/// Owning `(item, cursor)` iterator over one page
#[derive(Debug)]
pub struct IntoWithCursor<T> {
    inner: std::iter::Zip<vec::IntoIter<T>, vec::IntoIter<Cursor>>,
}

impl<T> Iterator for IntoWithCursor<T> {
    type Item = (T, Cursor);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoWithCursor<T> {}
