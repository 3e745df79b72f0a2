//! Cross-page pagination scenarios
//!
//! These run against a scripted service that expects an exact sequence of
//! queries, answers each with a canned batch, and fails the test on any
//! request it was not told to expect.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::cursor::Cursor;
use crate::entity::{Entity, Key};
use crate::error::{DatastoreError, Result};
use crate::query::{Query, QueryContext};
use crate::results::{Continuation, MoreResults, QueryResults};
use crate::service::{EntityResult, QueryBatch, QueryService};

const PROJECT: &str = "my-todo-project";

struct Expectation {
    query: Query,
    response: Result<QueryBatch<Entity>>,
}

struct MockService {
    expected: RefCell<VecDeque<Expectation>>,
    calls: RefCell<usize>,
}

impl MockService {
    fn new() -> Self {
        Self {
            expected: RefCell::new(VecDeque::new()),
            calls: RefCell::new(0),
        }
    }

    fn expect(self, query: Query, response: Result<QueryBatch<Entity>>) -> Self {
        self.expected
            .borrow_mut()
            .push_back(Expectation { query, response });
        self
    }

    fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    fn verify(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "{} expected request(s) were never made",
            self.expected.borrow().len()
        );
    }
}

impl QueryService for MockService {
    type Item = Entity;

    fn run_query(&self, context: &QueryContext, query: &Query) -> Result<QueryBatch<Entity>> {
        *self.calls.borrow_mut() += 1;
        assert_eq!(context.project_id, PROJECT);
        let next = self
            .expected
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request: {query:?}"));
        assert_eq!(query, &next.query, "request did not match expectation");
        next.response
    }
}

fn entity_batch(page: i64, status: MoreResults, end_cursor: Option<&str>) -> QueryBatch<Entity> {
    let results = (0..25)
        .map(|i| {
            EntityResult::new(
                Entity::with_key(Key::with_id("ds-test", page * 1000 + i)).set("name", "thingamajig"),
                Cursor::from(format!("result-cursor-{page}-{i}").as_str()),
            )
        })
        .collect();
    let batch = QueryBatch::new(results, status);
    match end_cursor {
        Some(cursor) => batch.with_end_cursor(Cursor::from(cursor)),
        None => batch,
    }
}

fn first_query() -> Query {
    Query::new().kind("Task")
}

fn next_query() -> Query {
    Query::new()
        .kind("Task")
        .start(Cursor::from("second-page-cursor"))
}

fn two_page_service() -> MockService {
    MockService::new()
        .expect(
            first_query(),
            Ok(entity_batch(1, MoreResults::NotFinished, Some("second-page-cursor"))),
        )
        .expect(
            next_query(),
            Ok(entity_batch(2, MoreResults::NoMoreResults, None)),
        )
}

fn run(service: &MockService) -> QueryResults<'_, MockService> {
    let continuation = Continuation::new(service, QueryContext::new(PROJECT));
    let page = continuation.run(first_query()).unwrap();
    QueryResults::new(page, continuation)
}

#[test]
fn test_paginates_with_next() {
    let service = two_page_service();
    let first = run(&service);

    assert_eq!(first.len(), 25);
    assert_eq!(
        first.cursor_for(first.first().unwrap()).unwrap(),
        &Cursor::from("result-cursor-1-0")
    );
    assert_eq!(
        first.cursor_for(first.last().unwrap()).unwrap(),
        &Cursor::from("result-cursor-1-24")
    );

    // the pair iterator can be mapped before it is driven
    let keyed: Vec<(Key, Cursor)> = first
        .iter_with_cursor()
        .map(|(entity, cursor)| (entity.key().cloned().unwrap(), cursor.clone()))
        .collect();
    assert_eq!(keyed.len(), 25);
    assert_eq!(keyed[3], (Key::with_id("ds-test", 1003), Cursor::from("result-cursor-1-3")));

    assert_eq!(first.cursor(), Some(&Cursor::from("second-page-cursor")));
    assert_eq!(first.end_cursor(), Some(&Cursor::from("second-page-cursor")));
    assert_eq!(first.more_results(), MoreResults::NotFinished);
    assert!(first.is_not_finished());
    assert!(!first.has_more_after_limit());
    assert!(!first.has_more_after_cursor());
    assert!(!first.is_exhausted());

    assert!(first.has_next());
    let next = first.next().unwrap();

    assert_eq!(
        next.cursor_for(next.first().unwrap()).unwrap(),
        &Cursor::from("result-cursor-2-0")
    );
    assert_eq!(
        next.cursor_for(next.last().unwrap()).unwrap(),
        &Cursor::from("result-cursor-2-24")
    );
    assert!(next.cursor().is_none());
    assert!(next.end_cursor().is_none());
    assert_eq!(next.more_results(), MoreResults::NoMoreResults);
    assert!(!next.is_not_finished());
    assert!(!next.has_more_after_limit());
    assert!(!next.has_more_after_cursor());
    assert!(next.is_exhausted());
    assert!(!next.has_next());

    // pages do not overlap
    assert_eq!(next.first().unwrap().key(), Some(&Key::with_id("ds-test", 2000)));

    service.verify();
}

#[test]
fn test_all_yields_every_entity() {
    let service = two_page_service();
    let entities: Vec<Entity> = run(&service).all().collect::<Result<_>>().unwrap();

    assert_eq!(entities.len(), 50);
    assert!(entities.iter().all(|e| e.get("name").is_some()));
    service.verify();
}

#[test]
fn test_all_count() {
    let service = two_page_service();
    assert_eq!(run(&service).all().count(), 50);
    service.verify();
}

#[test]
fn test_all_map_preserves_fetch_order() {
    let service = two_page_service();
    let keys: Vec<Key> = run(&service)
        .all()
        .map(|entity| entity.unwrap().key.unwrap())
        .collect();

    let expected: Vec<Key> = (1000..1025)
        .chain(2000..2025)
        .map(|id| Key::with_id("ds-test", id))
        .collect();
    assert_eq!(keys, expected);
    service.verify();
}

#[test]
fn test_all_with_cursor_uses_page_local_cursors() {
    let service = two_page_service();
    let pairs: Vec<(Entity, Cursor)> = run(&service)
        .all_with_cursor()
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(pairs.len(), 50);
    for (entity, cursor) in &pairs {
        let Some(crate::entity::KeyId::Id(id)) = entity.key().and_then(|k| k.id.clone()) else {
            panic!("entity without numeric id");
        };
        let expected = format!("result-cursor-{}-{}", id / 1000, id % 1000);
        assert_eq!(cursor, &Cursor::from(expected.as_str()));
    }
    service.verify();
}

#[test]
fn test_all_fetches_only_on_demand() {
    let service = two_page_service();
    let mut all = run(&service).all();

    let first_page: Vec<_> = all.by_ref().take(25).collect();
    assert_eq!(first_page.len(), 25);
    assert_eq!(service.calls(), 1);
    assert_eq!(all.pages_fetched(), 0);

    assert!(all.next().unwrap().is_ok());
    assert_eq!(service.calls(), 2);
    assert_eq!(all.pages_fetched(), 1);
}

#[test]
fn test_next_on_exhausted_page_issues_no_request() {
    let service = MockService::new().expect(
        first_query(),
        Ok(entity_batch(1, MoreResults::NoMoreResults, None)),
    );
    let results = run(&service);

    assert!(!results.has_next());
    let err = results.next().unwrap_err();
    assert!(err.is_illegal_continuation());
    assert_eq!(service.calls(), 1);
    service.verify();
}

#[test]
fn test_continuable_status_without_end_cursor_stops() {
    let service = MockService::new().expect(
        first_query(),
        Ok(entity_batch(1, MoreResults::MoreResultsAfterCursor, None)),
    );
    let results = run(&service);

    assert!(!results.has_next());
    assert!(results.next().unwrap_err().is_illegal_continuation());
    assert_eq!(results.all().count(), 25);
    assert_eq!(service.calls(), 1);
}

#[test]
fn test_more_after_limit_continues() {
    let limited = Query::new().kind("Task").limit(25);
    let service = MockService::new()
        .expect(
            limited.clone(),
            Ok(entity_batch(1, MoreResults::MoreResultsAfterLimit, Some("after-limit"))),
        )
        .expect(
            limited.clone().start(Cursor::from("after-limit")),
            Ok(entity_batch(2, MoreResults::NoMoreResults, None)),
        );

    let continuation = Continuation::new(&service, QueryContext::new(PROJECT));
    let page = continuation.run(limited).unwrap();
    assert!(page.has_more_after_limit());
    assert!(continuation.has_next(&page));

    let next = continuation.next(&page).unwrap();
    assert_eq!(next.len(), 25);
    assert!(!continuation.has_next(&next));
    service.verify();
}

#[test]
fn test_offset_is_not_reapplied() {
    let skipping = Query::new().kind("Task").offset(30);
    let service = MockService::new()
        .expect(
            skipping.clone(),
            Ok(QueryBatch::new(Vec::new(), MoreResults::NotFinished)
                .with_end_cursor(Cursor::from("skipped-20"))
                .with_skipped_results(20)),
        )
        .expect(
            Query::new()
                .kind("Task")
                .offset(10)
                .start(Cursor::from("skipped-20")),
            Ok(entity_batch(1, MoreResults::NoMoreResults, None).with_skipped_results(10)),
        );

    let continuation = Continuation::new(&service, QueryContext::new(PROJECT));
    let page = continuation.run(skipping).unwrap();
    assert!(page.is_empty());

    assert_eq!(continuation.all(page).count(), 25);
    service.verify();
}

#[test]
fn test_request_limit_caps_follow_up_requests() {
    let service = two_page_service();
    let results = run(&service).with_request_limit(Some(0));
    assert_eq!(results.all().count(), 25);
    assert_eq!(service.calls(), 1);

    let service = two_page_service();
    let all = run(&service).all_with_cursor().with_request_limit(1);
    assert_eq!(all.count(), 50);
    service.verify();
}

#[test]
fn test_transport_error_ends_traversal() {
    let service = MockService::new()
        .expect(
            first_query(),
            Ok(entity_batch(1, MoreResults::NotFinished, Some("second-page-cursor"))),
        )
        .expect(
            next_query(),
            Err(DatastoreError::transport("DEADLINE_EXCEEDED: took too long")),
        );

    let mut all = run(&service).all();
    let yielded: Vec<Entity> = all.by_ref().take(25).map(|r| r.unwrap()).collect();
    assert_eq!(yielded.len(), 25);

    let err = all.next().unwrap().unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.to_string(), "Query service error: DEADLINE_EXCEEDED: took too long");
    assert!(all.next().is_none());
    assert!(all.next().is_none());
    assert_eq!(service.calls(), 2);
    service.verify();
}

#[test]
fn test_repeated_keys_are_not_merged() {
    let repeated = || {
        let results = (0..3)
            .map(|i| {
                EntityResult::new(
                    Entity::with_key(Key::with_id("Task", 1)),
                    Cursor::from(format!("dup-{i}").as_str()),
                )
            })
            .collect();
        QueryBatch::new(results, MoreResults::NotFinished)
    };
    let service = MockService::new()
        .expect(
            first_query(),
            Ok(repeated().with_end_cursor(Cursor::from("second-page-cursor"))),
        )
        .expect(
            next_query(),
            Ok(QueryBatch {
                more_results: MoreResults::NoMoreResults,
                ..repeated()
            }),
        );

    let cursors: Vec<Cursor> = run(&service)
        .all_with_cursor()
        .map(|pair| pair.unwrap().1)
        .collect();
    assert_eq!(cursors.len(), 6);
    assert_eq!(cursors[3], Cursor::from("dup-0"));
    service.verify();
}
