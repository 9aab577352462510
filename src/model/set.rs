//! Unordered, duplicate-free statement collections
//!
//! [`StatementSet`] is the delta buffer used by the inference engine: it
//! never contains the same statement twice and insertion reports whether the
//! element was new.

use super::statement::Statement;
use super::types::{NamedNode, Resource, Value};
use rustc_hash::FxHashSet;

/// A duplicate-free set of statements.
#[derive(Debug, Clone, Default)]
pub struct StatementSet {
    statements: FxHashSet<Statement>,
}

impl StatementSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a statement. Returns `true` iff it was not already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        self.statements.insert(statement)
    }

    /// Number of statements in the set
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// True if the set holds no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Remove all statements
    pub fn clear(&mut self) {
        self.statements.clear();
    }

    /// Iterate over all statements
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Iterate over the statements matching the given terms.
    ///
    /// `None` on a position matches any term.
    pub fn matching<'a>(
        &'a self,
        subject: Option<&'a Resource>,
        predicate: Option<&'a NamedNode>,
        object: Option<&'a Value>,
    ) -> impl Iterator<Item = &'a Statement> {
        self.statements.iter().filter(move |st| {
            subject.is_none_or(|s| s == &st.subject)
                && predicate.is_none_or(|p| p == &st.predicate)
                && object.is_none_or(|o| o == &st.object)
        })
    }
}

impl Extend<Statement> for StatementSet {
    fn extend<I: IntoIterator<Item = Statement>>(&mut self, iter: I) {
        self.statements.extend(iter);
    }
}

impl IntoIterator for StatementSet {
    type Item = Statement;
    type IntoIter = <FxHashSet<Statement> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{}", local)).unwrap()
    }

    fn statement(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(example(s).into(), example(p), example(o).into())
    }

    #[test]
    fn test_idempotent_insert() {
        let mut set = StatementSet::new();
        assert!(set.insert(statement("a", "p", "b")));
        assert!(!set.insert(statement("a", "p", "b")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_matching() {
        let mut set = StatementSet::new();
        set.insert(statement("a", "p", "b"));
        set.insert(statement("a", "q", "c"));
        set.insert(statement("d", "p", "b"));

        assert_eq!(set.matching(None, None, None).count(), 3);

        let p = example("p");
        assert_eq!(set.matching(None, Some(&p), None).count(), 2);

        let a: Resource = example("a").into();
        assert_eq!(set.matching(Some(&a), Some(&p), None).count(), 1);

        let missing = example("missing");
        assert_eq!(set.matching(None, Some(&missing), None).count(), 0);
    }
}
