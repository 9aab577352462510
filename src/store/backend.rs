//! The abstract backend contract
//!
//! Any statement store (in-memory set, on-disk index, remote endpoint) plugs
//! into the connection layer by implementing [`StatementStore`]. Backends
//! that additionally support inferred-statement bookkeeping implement
//! [`InferenceSupport`], which is what the forward-chaining engine requires.

use super::error::StoreResult;
use super::query::{BindingSet, PatternQuery};
use crate::model::{NamedNode, Resource, Statement, Value};

/// A finite, restartable-per-call sequence of statements
pub type StatementIter = Box<dyn Iterator<Item = Statement> + Send>;

/// A sequence of context (named graph) identifiers
pub type ResourceIter = Box<dyn Iterator<Item = Resource> + Send>;

/// A sequence of (prefix, namespace IRI) pairs
pub type NamespaceIter = Box<dyn Iterator<Item = (String, String)> + Send>;

/// A sequence of query solutions
pub type BindingIter = Box<dyn Iterator<Item = BindingSet> + Send>;

/// The physical statement store backing one connection.
///
/// The handle is exclusively owned by its connection; all cross-thread
/// serialization is the connection's responsibility, so implementations only
/// need interior consistency.
pub trait StatementStore: Send + Sync {
    /// Get all statements matching the given terms.
    ///
    /// `None` on a position matches any term. An empty `contexts` slice
    /// selects every context; a `None` entry selects the default graph.
    fn get_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        include_inferred: bool,
        contexts: &[Option<Resource>],
    ) -> StoreResult<StatementIter>;

    /// Add an explicitly asserted statement.
    ///
    /// Returns `true` iff the store changed: the statement was absent, or
    /// was previously known only as inferred and is now asserted.
    fn add_statement(&self, statement: Statement) -> StoreResult<bool>;

    /// Remove all explicitly asserted statements matching the given terms.
    ///
    /// Returns the removed statements so the caller can notify listeners.
    fn remove_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        contexts: &[Option<Resource>],
    ) -> StoreResult<Vec<Statement>>;

    /// Remove all explicitly asserted statements in the given contexts.
    fn clear(&self, contexts: &[Option<Resource>]) -> StoreResult<Vec<Statement>>;

    /// Number of explicitly asserted statements in the given contexts
    fn size(&self, contexts: &[Option<Resource>]) -> StoreResult<u64>;

    /// Identifiers of all named contexts that hold at least one statement
    fn get_context_ids(&self) -> StoreResult<ResourceIter>;

    /// Begin a physical transaction
    fn start_transaction(&self) -> StoreResult<()>;

    /// Commit the active transaction
    fn commit(&self) -> StoreResult<()>;

    /// Roll back the active transaction
    fn rollback(&self) -> StoreResult<()>;

    /// Get the namespace IRI bound to a prefix
    fn get_namespace(&self, prefix: &str) -> StoreResult<Option<String>>;

    /// Bind a prefix to a namespace IRI
    fn set_namespace(&self, prefix: &str, name: &str) -> StoreResult<()>;

    /// Remove a prefix binding
    fn remove_namespace(&self, prefix: &str) -> StoreResult<()>;

    /// Remove all prefix bindings
    fn clear_namespaces(&self) -> StoreResult<()>;

    /// All (prefix, namespace IRI) bindings
    fn get_namespaces(&self) -> StoreResult<NamespaceIter>;

    /// Evaluate a pattern query against the store.
    ///
    /// Query evaluation is an external collaborator; this single entry point
    /// is all the connection layer requires.
    fn evaluate(
        &self,
        query: &PatternQuery,
        bindings: &BindingSet,
        include_inferred: bool,
    ) -> StoreResult<BindingIter>;

    /// Backend-specific teardown, invoked once when the connection closes
    fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Extension contract for backends that track inferred statements separately
/// from asserted ones.
pub trait InferenceSupport: StatementStore {
    /// Add an inferred statement to the default graph.
    ///
    /// Returns `true` iff the statement was not yet present in any form.
    /// Re-adding an existing fact is a no-op and must report `false`; the
    /// fixpoint loop relies on this to terminate on cyclic schemas.
    fn add_inferred_statement(
        &self,
        subject: Resource,
        predicate: NamedNode,
        object: Value,
    ) -> StoreResult<bool>;

    /// Drop every inferred statement. Returns how many were dropped.
    fn clear_inferred(&self) -> StoreResult<usize>;
}

/// Receives a notification for every statement added to or removed from the
/// store through its connection, regardless of which code path produced it.
pub trait ConnectionListener: Send + Sync {
    /// A statement was added
    fn statement_added(&self, statement: &Statement);

    /// A statement was removed
    fn statement_removed(&self, statement: &Statement);
}
