//! In-memory reference backend
//!
//! Statements live in a hash map whose value records whether the statement
//! is explicitly asserted (`true`) or only inferred (`false`). Transactions
//! are an undo log replayed in reverse on rollback. Sequences are snapshots,
//! so callers can iterate while the store keeps moving.

use std::sync::RwLock;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::backend::{
    BindingIter, InferenceSupport, NamespaceIter, ResourceIter, StatementIter, StatementStore,
};
use super::error::{StoreError, StoreResult};
use super::query::{BindingSet, PatternElement, PatternQuery, QueryPattern};
use crate::model::{NamedNode, Resource, Statement, Value};

enum UndoOp {
    /// Statement inserted (either asserted or inferred); undo removes it
    Added(Statement),
    /// Statement removed with the given asserted flag; undo reinserts it
    Removed(Statement, bool),
    /// Inferred statement upgraded to asserted; undo downgrades it
    Upgraded(Statement),
    /// Namespace binding set; undo restores the previous binding
    NamespaceSet { prefix: String, previous: Option<String> },
    /// All namespace bindings cleared; undo restores them
    NamespacesCleared(IndexMap<String, String>),
}

#[derive(Default)]
struct MemoryInner {
    /// Statement -> explicitly asserted flag
    statements: FxHashMap<Statement, bool>,
    namespaces: IndexMap<String, String>,
    undo: Option<Vec<UndoOp>>,
}

impl MemoryInner {
    fn log(&mut self, op: UndoOp) {
        if let Some(undo) = self.undo.as_mut() {
            undo.push(op);
        }
    }

    fn matching(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        include_inferred: bool,
        contexts: &[Option<Resource>],
    ) -> Vec<Statement> {
        self.statements
            .iter()
            .filter(|(st, asserted)| {
                (include_inferred || **asserted)
                    && subject.is_none_or(|s| s == &st.subject)
                    && predicate.is_none_or(|p| p == &st.predicate)
                    && object.is_none_or(|o| o == &st.object)
                    && st.in_contexts(contexts)
            })
            .map(|(st, _)| st.clone())
            .collect()
    }
}

/// In-memory statement store with inferred-statement bookkeeping
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, MemoryInner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Lock("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, MemoryInner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Lock("memory store lock poisoned".into()))
    }
}

impl StatementStore for MemoryStore {
    fn get_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        include_inferred: bool,
        contexts: &[Option<Resource>],
    ) -> StoreResult<StatementIter> {
        let inner = self.read()?;
        let snapshot = inner.matching(subject, predicate, object, include_inferred, contexts);
        Ok(Box::new(snapshot.into_iter()))
    }

    fn add_statement(&self, statement: Statement) -> StoreResult<bool> {
        let mut inner = self.write()?;
        match inner.statements.get_mut(&statement) {
            None => {
                inner.statements.insert(statement.clone(), true);
                inner.log(UndoOp::Added(statement));
                Ok(true)
            }
            Some(asserted) if !*asserted => {
                // Explicit assertion of a previously inferred fact
                *asserted = true;
                inner.log(UndoOp::Upgraded(statement));
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    fn remove_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        contexts: &[Option<Resource>],
    ) -> StoreResult<Vec<Statement>> {
        let mut inner = self.write()?;
        let matching = inner.matching(subject, predicate, object, false, contexts);
        for st in &matching {
            inner.statements.remove(st);
            inner.log(UndoOp::Removed(st.clone(), true));
        }
        Ok(matching)
    }

    fn clear(&self, contexts: &[Option<Resource>]) -> StoreResult<Vec<Statement>> {
        self.remove_statements(None, None, None, contexts)
    }

    fn size(&self, contexts: &[Option<Resource>]) -> StoreResult<u64> {
        let inner = self.read()?;
        let count = inner
            .statements
            .iter()
            .filter(|(st, asserted)| **asserted && st.in_contexts(contexts))
            .count();
        Ok(count as u64)
    }

    fn get_context_ids(&self) -> StoreResult<ResourceIter> {
        let inner = self.read()?;
        let mut contexts: Vec<Resource> = Vec::new();
        for st in inner.statements.keys() {
            if let Some(ctx) = &st.context {
                if !contexts.contains(ctx) {
                    contexts.push(ctx.clone());
                }
            }
        }
        Ok(Box::new(contexts.into_iter()))
    }

    fn start_transaction(&self) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.undo.is_none() {
            inner.undo = Some(Vec::new());
        }
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.undo = None;
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        let mut inner = self.write()?;
        let Some(undo) = inner.undo.take() else {
            return Ok(());
        };
        debug!(ops = undo.len(), "rolling back memory store transaction");
        for op in undo.into_iter().rev() {
            match op {
                UndoOp::Added(st) => {
                    inner.statements.remove(&st);
                }
                UndoOp::Removed(st, asserted) => {
                    inner.statements.insert(st, asserted);
                }
                UndoOp::Upgraded(st) => {
                    inner.statements.insert(st, false);
                }
                UndoOp::NamespaceSet { prefix, previous } => match previous {
                    Some(name) => {
                        inner.namespaces.insert(prefix, name);
                    }
                    None => {
                        inner.namespaces.shift_remove(&prefix);
                    }
                },
                UndoOp::NamespacesCleared(namespaces) => {
                    inner.namespaces = namespaces;
                }
            }
        }
        Ok(())
    }

    fn get_namespace(&self, prefix: &str) -> StoreResult<Option<String>> {
        Ok(self.read()?.namespaces.get(prefix).cloned())
    }

    fn set_namespace(&self, prefix: &str, name: &str) -> StoreResult<()> {
        let mut inner = self.write()?;
        let previous = inner.namespaces.insert(prefix.to_owned(), name.to_owned());
        inner.log(UndoOp::NamespaceSet {
            prefix: prefix.to_owned(),
            previous,
        });
        Ok(())
    }

    fn remove_namespace(&self, prefix: &str) -> StoreResult<()> {
        let mut inner = self.write()?;
        if let Some(previous) = inner.namespaces.shift_remove(prefix) {
            inner.log(UndoOp::NamespaceSet {
                prefix: prefix.to_owned(),
                previous: Some(previous),
            });
        }
        Ok(())
    }

    fn clear_namespaces(&self) -> StoreResult<()> {
        let mut inner = self.write()?;
        let previous = std::mem::take(&mut inner.namespaces);
        inner.log(UndoOp::NamespacesCleared(previous));
        Ok(())
    }

    fn get_namespaces(&self) -> StoreResult<NamespaceIter> {
        let inner = self.read()?;
        let snapshot: Vec<(String, String)> = inner
            .namespaces
            .iter()
            .map(|(prefix, name)| (prefix.clone(), name.clone()))
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn evaluate(
        &self,
        query: &PatternQuery,
        bindings: &BindingSet,
        include_inferred: bool,
    ) -> StoreResult<BindingIter> {
        let inner = self.read()?;
        let snapshot = inner.matching(None, None, None, include_inferred, &[]);
        drop(inner);

        // Naive scan-and-join; patterns match statements in every context.
        let mut solutions = vec![bindings.clone()];
        for pattern in &query.patterns {
            let mut next = Vec::new();
            for solution in &solutions {
                for st in &snapshot {
                    if let Some(merged) = match_pattern(pattern, st, solution) {
                        if !next.contains(&merged) {
                            next.push(merged);
                        }
                    }
                }
            }
            solutions = next;
            if solutions.is_empty() {
                break;
            }
        }
        Ok(Box::new(solutions.into_iter()))
    }
}

impl InferenceSupport for MemoryStore {
    fn add_inferred_statement(
        &self,
        subject: Resource,
        predicate: NamedNode,
        object: Value,
    ) -> StoreResult<bool> {
        let statement = Statement::new(subject, predicate, object);
        let mut inner = self.write()?;
        if inner.statements.contains_key(&statement) {
            return Ok(false);
        }
        inner.statements.insert(statement.clone(), false);
        inner.log(UndoOp::Added(statement));
        Ok(true)
    }

    fn clear_inferred(&self) -> StoreResult<usize> {
        let mut inner = self.write()?;
        let inferred: Vec<Statement> = inner
            .statements
            .iter()
            .filter(|(_, asserted)| !**asserted)
            .map(|(st, _)| st.clone())
            .collect();
        for st in &inferred {
            inner.statements.remove(st);
            inner.log(UndoOp::Removed(st.clone(), false));
        }
        Ok(inferred.len())
    }
}

/// Try to extend `solution` so that `pattern` matches `statement`.
fn match_pattern(
    pattern: &QueryPattern,
    statement: &Statement,
    solution: &BindingSet,
) -> Option<BindingSet> {
    let mut merged = solution.clone();

    let subject: Value = statement.subject.clone().into();
    match &pattern.subject {
        PatternElement::Term(term) => {
            if term != &statement.subject {
                return None;
            }
        }
        PatternElement::Variable(var) => match merged.value(var) {
            Some(bound) if bound != &subject => return None,
            Some(_) => {}
            None => {
                merged.set(var.clone(), subject);
            }
        },
    }

    let predicate: Value = statement.predicate.clone().into();
    match &pattern.predicate {
        PatternElement::Term(term) => {
            if term != &statement.predicate {
                return None;
            }
        }
        PatternElement::Variable(var) => match merged.value(var) {
            Some(bound) if bound != &predicate => return None,
            Some(_) => {}
            None => {
                merged.set(var.clone(), predicate);
            }
        },
    }

    match &pattern.object {
        PatternElement::Term(term) => {
            if term != &statement.object {
                return None;
            }
        }
        PatternElement::Variable(var) => match merged.value(var) {
            Some(bound) if bound != &statement.object => return None,
            Some(_) => {}
            None => {
                merged.set(var.clone(), statement.object.clone());
            }
        },
    }

    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::query::Variable;

    fn example(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{}", local)).unwrap()
    }

    fn statement(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(example(s).into(), example(p), example(o).into())
    }

    fn add(store: &MemoryStore, s: &str, p: &str, o: &str) -> bool {
        store.add_statement(statement(s, p, o)).unwrap()
    }

    #[test]
    fn test_add_and_size() {
        let store = MemoryStore::new();
        assert!(add(&store, "a", "p", "b"));
        assert!(!add(&store, "a", "p", "b"));
        assert_eq!(store.size(&[]).unwrap(), 1);
    }

    #[test]
    fn test_inferred_dedup_and_size() {
        let store = MemoryStore::new();
        let st = statement("a", "p", "b");
        assert!(store
            .add_inferred_statement(st.subject.clone(), st.predicate.clone(), st.object.clone())
            .unwrap());
        assert!(!store
            .add_inferred_statement(st.subject.clone(), st.predicate.clone(), st.object.clone())
            .unwrap());

        // Inferred statements are excluded from size and plain reads
        assert_eq!(store.size(&[]).unwrap(), 0);
        assert_eq!(
            store
                .get_statements(None, None, None, false, &[])
                .unwrap()
                .count(),
            0
        );
        assert_eq!(
            store
                .get_statements(None, None, None, true, &[])
                .unwrap()
                .count(),
            1
        );
    }

    #[test]
    fn test_explicit_add_upgrades_inferred() {
        let store = MemoryStore::new();
        let st = statement("a", "p", "b");
        store
            .add_inferred_statement(st.subject.clone(), st.predicate.clone(), st.object.clone())
            .unwrap();

        // The upgrade counts as a store change
        assert!(store.add_statement(st.clone()).unwrap());
        assert_eq!(store.size(&[]).unwrap(), 1);

        // Removing the explicit statement removes the fact entirely
        let removed = store.remove_statements(None, None, None, &[]).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(
            store
                .get_statements(None, None, None, true, &[])
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn test_rollback_restores_state() {
        let store = MemoryStore::new();
        add(&store, "a", "p", "b");
        store.set_namespace("ex", "http://example.org/").unwrap();

        store.start_transaction().unwrap();
        add(&store, "c", "p", "d");
        store.remove_statements(Some(&example("a").into()), None, None, &[]).unwrap();
        store.set_namespace("ex", "http://other.example/").unwrap();
        store.rollback().unwrap();

        assert_eq!(store.size(&[]).unwrap(), 1);
        assert_eq!(
            store
                .get_statements(Some(&example("a").into()), None, None, false, &[])
                .unwrap()
                .count(),
            1
        );
        assert_eq!(
            store.get_namespace("ex").unwrap().as_deref(),
            Some("http://example.org/")
        );
    }

    #[test]
    fn test_context_ids() {
        let store = MemoryStore::new();
        add(&store, "a", "p", "b");
        let g: Resource = example("g").into();
        store
            .add_statement(Statement::with_context(
                example("a").into(),
                example("p"),
                example("b").into(),
                Some(g.clone()),
            ))
            .unwrap();

        let contexts: Vec<Resource> = store.get_context_ids().unwrap().collect();
        assert_eq!(contexts, vec![g]);
    }

    #[test]
    fn test_evaluate_join() {
        let store = MemoryStore::new();
        add(&store, "alice", "knows", "bob");
        add(&store, "bob", "knows", "carol");
        add(&store, "alice", "age", "unrelated");

        let x = Variable::new("x");
        let y = Variable::new("y");
        let z = Variable::new("z");
        let query = PatternQuery::new(vec![
            QueryPattern::new(
                PatternElement::Variable(x.clone()),
                PatternElement::Term(example("knows")),
                PatternElement::Variable(y.clone()),
            ),
            QueryPattern::new(
                PatternElement::Variable(y.clone()),
                PatternElement::Term(example("knows")),
                PatternElement::Variable(z.clone()),
            ),
        ]);

        let solutions: Vec<BindingSet> = store
            .evaluate(&query, &BindingSet::new(), false)
            .unwrap()
            .collect();
        assert_eq!(solutions.len(), 1);
        let solution = &solutions[0];
        assert_eq!(solution.get("x"), Some(&example("alice").into()));
        assert_eq!(solution.get("y"), Some(&example("bob").into()));
        assert_eq!(solution.get("z"), Some(&example("carol").into()));
    }
}
