//! Connection lifecycle manager
//!
//! Wraps one statement-store handle per logical session and enforces the
//! concurrency contract every backend must honor:
//!
//! - a *connection lock* (read-write) guards the open/closed transition:
//!   every operation holds it shared, `close()` holds it exclusive and so
//!   waits for in-flight operations before blocking further ones;
//! - a *transaction lock* (mutex) serializes all state-mutating operations,
//!   commit, and rollback against each other.
//!
//! Both locks are held through scoped guards, so release on every exit path
//! is structural rather than a per-call-site discipline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use super::backend::{ConnectionListener, InferenceSupport, StatementStore};
use super::error::{StoreError, StoreResult};
use super::iteration::{IterationRegistry, TrackedIteration};
use super::query::{BindingSet, PatternQuery};
use crate::model::{NamedNode, Resource, Statement, Value};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

/// A logical session against one statement store.
///
/// The store handle is exclusively owned by this connection. The connection
/// starts open and transitions to closed exactly once; every operation on a
/// closed connection fails with [`StoreError::ConnectionClosed`].
pub struct Connection<S: StatementStore> {
    id: u64,
    store: S,
    /// Connection lock; the guarded flag is the open state.
    open: RwLock<bool>,
    /// Transaction lock; the guarded flag is the transaction-active state.
    txn_active: Mutex<bool>,
    iterations: IterationRegistry,
    listeners: Mutex<Vec<Arc<dyn ConnectionListener>>>,
}

impl<S: StatementStore> Connection<S> {
    /// Open a connection owning the given store handle
    pub fn new(store: S) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            store,
            open: RwLock::new(true),
            txn_active: Mutex::new(false),
            iterations: Arc::new(Mutex::new(Vec::new())),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The connection identifier, unique within the process
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True until `close` completes
    pub fn is_open(&self) -> StoreResult<bool> {
        Ok(*self.shared_lock()?)
    }

    /// Close this connection.
    ///
    /// Waits for in-flight operations, force-closes every outstanding result
    /// sequence, rolls back an unfinished transaction, and runs the backend
    /// teardown. Idempotent: a second call is a no-op.
    pub fn close(&self) -> StoreResult<()> {
        let mut open = self.exclusive_lock()?;
        if !*open {
            return Ok(());
        }
        // The connection is closed from here on regardless of how teardown
        // goes; a failed rollback must not leave it half-open. The first
        // error encountered is reported after all steps have run.
        *open = false;

        let mut first_error = self.force_close_iterations().err();

        let rollback_result = match self.txn_lock() {
            Ok(mut txn) => {
                if *txn {
                    warn!(connection = self.id, "rolling back transaction due to connection close");
                    let result = self.store.rollback();
                    *txn = false;
                    result
                } else {
                    Ok(())
                }
            }
            Err(e) => Err(e),
        };
        if first_error.is_none() {
            first_error = rollback_result.err();
        }

        let teardown_result = self.store.close();
        if first_error.is_none() {
            first_error = teardown_result.err();
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Get all statements matching the given terms as a tracked sequence.
    ///
    /// The returned sequence is independently closeable and is force-closed
    /// if still outstanding when the connection closes.
    pub fn get_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        include_inferred: bool,
        contexts: &[Option<Resource>],
    ) -> StoreResult<TrackedIteration<Statement>> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let inner = self
            .store
            .get_statements(subject, predicate, object, include_inferred, contexts)?;
        Ok(TrackedIteration::register(inner, &self.iterations))
    }

    /// Identifiers of all named contexts holding at least one statement
    pub fn get_context_ids(&self) -> StoreResult<TrackedIteration<Resource>> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let inner = self.store.get_context_ids()?;
        Ok(TrackedIteration::register(inner, &self.iterations))
    }

    /// Number of explicitly asserted statements in the given contexts
    pub fn size(&self, contexts: &[Option<Resource>]) -> StoreResult<u64> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        self.store.size(contexts)
    }

    /// Evaluate a pattern query, producing a tracked sequence of solutions
    pub fn evaluate(
        &self,
        query: &PatternQuery,
        bindings: &BindingSet,
        include_inferred: bool,
    ) -> StoreResult<TrackedIteration<BindingSet>> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let inner = self.store.evaluate(query, bindings, include_inferred)?;
        Ok(TrackedIteration::register(inner, &self.iterations))
    }

    /// Add an explicitly asserted statement, auto-starting a transaction.
    ///
    /// An empty `contexts` slice adds to the default graph; otherwise one
    /// statement is added per selected context.
    pub fn add_statement(
        &self,
        subject: Resource,
        predicate: NamedNode,
        object: Value,
        contexts: &[Option<Resource>],
    ) -> StoreResult<()> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;

        let default_graph = [None];
        let contexts = if contexts.is_empty() {
            &default_graph[..]
        } else {
            contexts
        };
        for context in contexts {
            let statement = Statement::with_context(
                subject.clone(),
                predicate.clone(),
                object.clone(),
                context.clone(),
            );
            if self.store.add_statement(statement.clone())? {
                self.notify_added(&statement)?;
            }
        }
        Ok(())
    }

    /// Remove all explicitly asserted statements matching the given terms.
    ///
    /// Returns the number of statements removed.
    pub fn remove_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        contexts: &[Option<Resource>],
    ) -> StoreResult<usize> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;

        let removed = self
            .store
            .remove_statements(subject, predicate, object, contexts)?;
        for statement in &removed {
            self.notify_removed(statement)?;
        }
        Ok(removed.len())
    }

    /// Remove all explicitly asserted statements in the given contexts
    pub fn clear(&self, contexts: &[Option<Resource>]) -> StoreResult<usize> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;

        let removed = self.store.clear(contexts)?;
        for statement in &removed {
            self.notify_removed(statement)?;
        }
        Ok(removed.len())
    }

    /// Commit the active transaction, if any
    pub fn commit(&self) -> StoreResult<()> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        if *txn {
            self.store.commit()?;
            *txn = false;
        }
        Ok(())
    }

    /// Roll back the active transaction, if any
    pub fn rollback(&self) -> StoreResult<()> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        if *txn {
            let result = self.store.rollback();
            *txn = false;
            result?;
        }
        Ok(())
    }

    /// Get the namespace IRI bound to a prefix
    pub fn get_namespace(&self, prefix: &str) -> StoreResult<Option<String>> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        self.store.get_namespace(prefix)
    }

    /// All (prefix, namespace IRI) bindings as a tracked sequence
    pub fn get_namespaces(&self) -> StoreResult<TrackedIteration<(String, String)>> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let inner = self.store.get_namespaces()?;
        Ok(TrackedIteration::register(inner, &self.iterations))
    }

    /// Bind a prefix to a namespace IRI
    pub fn set_namespace(&self, prefix: &str, name: &str) -> StoreResult<()> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;
        self.store.set_namespace(prefix, name)
    }

    /// Remove a prefix binding
    pub fn remove_namespace(&self, prefix: &str) -> StoreResult<()> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;
        self.store.remove_namespace(prefix)
    }

    /// Remove all prefix bindings
    pub fn clear_namespaces(&self) -> StoreResult<()> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;
        self.store.clear_namespaces()
    }

    /// Register a listener for add/remove notifications.
    ///
    /// Registration is independent of the connection and transaction locks.
    /// Listeners are invoked while the notifying operation holds both, so
    /// they must not call back into mutating connection methods.
    pub fn add_listener(&self, listener: Arc<dyn ConnectionListener>) -> StoreResult<()> {
        self.listeners_lock()?.push(listener);
        Ok(())
    }

    /// Remove a previously registered listener
    pub fn remove_listener(&self, listener: &Arc<dyn ConnectionListener>) -> StoreResult<()> {
        self.listeners_lock()?.retain(|l| !Arc::ptr_eq(l, listener));
        Ok(())
    }

    fn notify_added(&self, statement: &Statement) -> StoreResult<()> {
        for listener in self.listeners_lock()?.iter() {
            listener.statement_added(statement);
        }
        Ok(())
    }

    fn notify_removed(&self, statement: &Statement) -> StoreResult<()> {
        for listener in self.listeners_lock()?.iter() {
            listener.statement_removed(statement);
        }
        Ok(())
    }

    fn listeners_lock(&self) -> StoreResult<MutexGuard<'_, Vec<Arc<dyn ConnectionListener>>>> {
        self.listeners
            .lock()
            .map_err(|_| StoreError::Lock("listener registry poisoned".into()))
    }

    fn verify_open(&self, open: &RwLockReadGuard<'_, bool>) -> StoreResult<()> {
        if **open {
            Ok(())
        } else {
            Err(StoreError::ConnectionClosed)
        }
    }

    fn auto_start_transaction(&self, txn: &mut MutexGuard<'_, bool>) -> StoreResult<()> {
        if !**txn {
            self.store.start_transaction()?;
            **txn = true;
        }
        Ok(())
    }

    fn force_close_iterations(&self) -> StoreResult<()> {
        let mut entries = self
            .iterations
            .lock()
            .map_err(|_| StoreError::Lock("iteration registry poisoned".into()))?;
        for weak in entries.drain(..) {
            if let Some(handle) = weak.upgrade() {
                if handle.force_close() {
                    warn!(
                        connection = self.id,
                        "forced closing of unclosed result sequence"
                    );
                }
            }
        }
        Ok(())
    }

    fn shared_lock(&self) -> StoreResult<RwLockReadGuard<'_, bool>> {
        self.open
            .read()
            .map_err(|_| StoreError::Lock("connection lock poisoned".into()))
    }

    fn exclusive_lock(&self) -> StoreResult<RwLockWriteGuard<'_, bool>> {
        self.open
            .write()
            .map_err(|_| StoreError::Lock("connection lock poisoned".into()))
    }

    fn txn_lock(&self) -> StoreResult<MutexGuard<'_, bool>> {
        self.txn_active
            .lock()
            .map_err(|_| StoreError::Lock("transaction lock poisoned".into()))
    }
}

impl<S: InferenceSupport> Connection<S> {
    /// Add an inferred statement through the backend's dedup primitive.
    ///
    /// Same lock and transaction discipline as `add_statement`; listeners
    /// are notified only when the statement is newly added. Returns `true`
    /// iff it was new.
    pub fn add_inferred_statement(
        &self,
        subject: Resource,
        predicate: NamedNode,
        object: Value,
    ) -> StoreResult<bool> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;

        let added = self
            .store
            .add_inferred_statement(subject.clone(), predicate.clone(), object.clone())?;
        if added {
            let statement = Statement::new(subject, predicate, object);
            self.notify_added(&statement)?;
        }
        Ok(added)
    }

    /// Drop every inferred statement. Listeners are not notified; the only
    /// caller is the entailment engine's from-scratch reset, which reloads
    /// the whole store afterwards.
    pub fn clear_inferred(&self) -> StoreResult<usize> {
        let open = self.shared_lock()?;
        self.verify_open(&open)?;
        let mut txn = self.txn_lock()?;
        self.auto_start_transaction(&mut txn)?;
        self.store.clear_inferred()
    }
}

impl<S: StatementStore> Drop for Connection<S> {
    fn drop(&mut self) {
        let still_open = self.open.get_mut().map(|open| *open).unwrap_or(false);
        if still_open {
            warn!(connection = self.id, "connection dropped while still open, closing");
            let _ = self.close();
        }
    }
}
