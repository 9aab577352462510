//! Connection lifecycle and concurrency contract tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use quadstore::model::{NamedNode, Resource, Statement, Value};
use quadstore::store::{
    BindingIter, BindingSet, Connection, ConnectionListener, MemoryStore, NamespaceIter,
    PatternQuery, ResourceIter, StatementIter, StatementStore, StoreError, StoreResult,
};

fn example(local: &str) -> NamedNode {
    NamedNode::new(&format!("http://example.org/{}", local)).unwrap()
}

fn add(con: &Connection<MemoryStore>, s: &str, p: &str, o: &str) {
    con.add_statement(example(s).into(), example(p), example(o).into(), &[])
        .unwrap();
}

#[test]
fn test_closed_connection_rejects_operations() {
    let con = Connection::new(MemoryStore::new());
    add(&con, "a", "p", "b");
    con.commit().unwrap();
    assert!(con.is_open().unwrap());

    con.close().unwrap();
    assert!(!con.is_open().unwrap());

    assert!(matches!(
        con.add_statement(example("c").into(), example("p"), example("d").into(), &[]),
        Err(StoreError::ConnectionClosed)
    ));
    assert!(matches!(
        con.get_statements(None, None, None, false, &[]),
        Err(StoreError::ConnectionClosed)
    ));
    assert!(matches!(con.size(&[]), Err(StoreError::ConnectionClosed)));
    assert!(matches!(con.commit(), Err(StoreError::ConnectionClosed)));

    // Close is idempotent
    con.close().unwrap();
}

#[test]
fn test_close_force_closes_outstanding_sequences() {
    let con = Connection::new(MemoryStore::new());
    add(&con, "a", "p", "b");
    add(&con, "c", "p", "d");
    con.commit().unwrap();

    let mut iter = con.get_statements(None, None, None, false, &[]).unwrap();
    assert!(iter.next().is_some());
    assert!(!iter.is_closed());

    con.close().unwrap();
    assert!(iter.is_closed());
    assert!(iter.next().is_none());
}

#[test]
fn test_transaction_auto_start_and_rollback() {
    let con = Connection::new(MemoryStore::new());

    // First mutation starts a transaction implicitly
    add(&con, "a", "p", "b");
    assert_eq!(con.size(&[]).unwrap(), 1);

    con.rollback().unwrap();
    assert_eq!(con.size(&[]).unwrap(), 0);

    add(&con, "a", "p", "b");
    con.commit().unwrap();

    // A rollback without an active transaction is a no-op
    con.rollback().unwrap();
    assert_eq!(con.size(&[]).unwrap(), 1);
    con.close().unwrap();
}

#[test]
fn test_add_to_multiple_contexts() {
    let con = Connection::new(MemoryStore::new());
    let g1: Resource = example("g1").into();
    let g2: Resource = example("g2").into();

    con.add_statement(
        example("a").into(),
        example("p"),
        example("b").into(),
        &[Some(g1.clone()), Some(g2.clone())],
    )
    .unwrap();
    con.commit().unwrap();

    assert_eq!(con.size(&[]).unwrap(), 2);
    assert_eq!(con.size(&[Some(g1.clone())]).unwrap(), 1);
    assert_eq!(con.size(&[None]).unwrap(), 0);

    let contexts: Vec<Resource> = con.get_context_ids().unwrap().collect();
    assert_eq!(contexts.len(), 2);

    // Removal scoped to one context leaves the other untouched
    let removed = con
        .remove_statements(None, None, None, &[Some(g1)])
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(con.size(&[]).unwrap(), 1);
    con.close().unwrap();
}

/// Backend whose rollback always fails, for close-path error handling
struct FailingRollbackStore;

impl StatementStore for FailingRollbackStore {
    fn get_statements(
        &self,
        _subject: Option<&Resource>,
        _predicate: Option<&NamedNode>,
        _object: Option<&Value>,
        _include_inferred: bool,
        _contexts: &[Option<Resource>],
    ) -> StoreResult<StatementIter> {
        Ok(Box::new(std::iter::empty()))
    }

    fn add_statement(&self, _statement: Statement) -> StoreResult<bool> {
        Ok(true)
    }

    fn remove_statements(
        &self,
        _subject: Option<&Resource>,
        _predicate: Option<&NamedNode>,
        _object: Option<&Value>,
        _contexts: &[Option<Resource>],
    ) -> StoreResult<Vec<Statement>> {
        Ok(Vec::new())
    }

    fn clear(&self, _contexts: &[Option<Resource>]) -> StoreResult<Vec<Statement>> {
        Ok(Vec::new())
    }

    fn size(&self, _contexts: &[Option<Resource>]) -> StoreResult<u64> {
        Ok(0)
    }

    fn get_context_ids(&self) -> StoreResult<ResourceIter> {
        Ok(Box::new(std::iter::empty()))
    }

    fn start_transaction(&self) -> StoreResult<()> {
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        Err(StoreError::Backend("rollback failed".into()))
    }

    fn get_namespace(&self, _prefix: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    fn set_namespace(&self, _prefix: &str, _name: &str) -> StoreResult<()> {
        Ok(())
    }

    fn remove_namespace(&self, _prefix: &str) -> StoreResult<()> {
        Ok(())
    }

    fn clear_namespaces(&self) -> StoreResult<()> {
        Ok(())
    }

    fn get_namespaces(&self) -> StoreResult<NamespaceIter> {
        Ok(Box::new(std::iter::empty()))
    }

    fn evaluate(
        &self,
        _query: &PatternQuery,
        _bindings: &BindingSet,
        _include_inferred: bool,
    ) -> StoreResult<BindingIter> {
        Ok(Box::new(std::iter::empty()))
    }
}

#[test]
fn test_close_reports_rollback_error_but_still_closes() {
    let con = Connection::new(FailingRollbackStore);
    con.add_statement(example("a").into(), example("p"), example("b").into(), &[])
        .unwrap();

    // The rollback failure is reported, but the connection must not stay
    // half-open
    assert!(matches!(con.close(), Err(StoreError::Backend(_))));
    assert!(!con.is_open().unwrap());

    // And a second close is still a no-op
    con.close().unwrap();
    assert!(matches!(con.size(&[]), Err(StoreError::ConnectionClosed)));
}

#[derive(Default)]
struct CountingListener {
    added: AtomicUsize,
    removed: AtomicUsize,
}

impl ConnectionListener for CountingListener {
    fn statement_added(&self, _statement: &Statement) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }

    fn statement_removed(&self, _statement: &Statement) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_listener_notifications() {
    let con = Connection::new(MemoryStore::new());
    let listener = Arc::new(CountingListener::default());
    con.add_listener(Arc::clone(&listener) as Arc<dyn ConnectionListener>)
        .unwrap();

    add(&con, "a", "p", "b");
    // Duplicate assertion is not a store change and is not notified
    add(&con, "a", "p", "b");
    add(&con, "c", "p", "d");
    assert_eq!(listener.added.load(Ordering::SeqCst), 2);

    con.remove_statements(Some(&example("a").into()), None, None, &[])
        .unwrap();
    assert_eq!(listener.removed.load(Ordering::SeqCst), 1);

    let erased = Arc::clone(&listener) as Arc<dyn ConnectionListener>;
    con.remove_listener(&erased).unwrap();
    add(&con, "e", "p", "f");
    assert_eq!(listener.added.load(Ordering::SeqCst), 2);
    con.close().unwrap();
}

struct PanickingListener;

impl ConnectionListener for PanickingListener {
    fn statement_added(&self, _statement: &Statement) {
        panic!("listener failure");
    }

    fn statement_removed(&self, _statement: &Statement) {}
}

#[test]
fn test_listener_panic_surfaces_on_later_mutations() {
    let con = Arc::new(Connection::new(MemoryStore::new()));
    con.add_listener(Arc::new(PanickingListener)).unwrap();

    // The panic unwinds through the mutation and poisons the lock state
    let writer = Arc::clone(&con);
    let result = thread::spawn(move || {
        writer.add_statement(example("a").into(), example("p"), example("b").into(), &[])
    })
    .join();
    assert!(result.is_err());

    // Later mutations report the poisoned state rather than silently
    // completing without notifying anyone
    assert!(matches!(
        con.add_statement(example("c").into(), example("p"), example("d").into(), &[]),
        Err(StoreError::Lock(_))
    ));
}

#[test]
fn test_concurrent_operations_against_close() {
    let con = Arc::new(Connection::new(MemoryStore::new()));
    for i in 0..10 {
        add(&con, &format!("s{}", i), "p", "o");
    }
    con.commit().unwrap();

    let mut workers = Vec::new();
    for _ in 0..4 {
        let con = Arc::clone(&con);
        workers.push(thread::spawn(move || loop {
            match con.get_statements(None, None, None, false, &[]) {
                Ok(iter) => {
                    // Close may force-close the sequence mid-iteration
                    assert!(iter.count() <= 10);
                }
                Err(StoreError::ConnectionClosed) => return,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }));
    }

    thread::sleep(Duration::from_millis(20));
    con.close().unwrap();

    for worker in workers {
        worker.join().unwrap();
    }
    assert!(!con.is_open().unwrap());
}

#[test]
fn test_namespace_management() {
    let con = Connection::new(MemoryStore::new());
    con.set_namespace("ex", "http://example.org/").unwrap();
    con.set_namespace("rdfs", "http://www.w3.org/2000/01/rdf-schema#")
        .unwrap();
    con.commit().unwrap();

    assert_eq!(
        con.get_namespace("ex").unwrap().as_deref(),
        Some("http://example.org/")
    );
    let all: Vec<(String, String)> = con.get_namespaces().unwrap().collect();
    assert_eq!(all.len(), 2);

    con.remove_namespace("ex").unwrap();
    assert_eq!(con.get_namespace("ex").unwrap(), None);

    con.clear_namespaces().unwrap();
    assert_eq!(con.get_namespaces().unwrap().count(), 0);

    // Namespace changes are transactional too
    con.rollback().unwrap();
    assert_eq!(
        con.get_namespace("ex").unwrap().as_deref(),
        Some("http://example.org/")
    );
    con.close().unwrap();
}

#[test]
fn test_remove_returns_count() {
    let con = Connection::new(MemoryStore::new());
    add(&con, "a", "p", "b");
    add(&con, "a", "q", "c");
    add(&con, "d", "p", "e");
    con.commit().unwrap();

    let removed = con
        .remove_statements(Some(&example("a").into()), None, None, &[])
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(con.size(&[]).unwrap(), 1);

    let remaining: Vec<Statement> = con
        .get_statements(None, None, None, false, &[])
        .unwrap()
        .collect();
    assert_eq!(remaining[0].subject, Resource::from(example("d")));
    assert_eq!(remaining[0].object, Value::from(example("e")));
    con.close().unwrap();
}
