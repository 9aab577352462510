//! Statements and statement patterns
//!
//! A [`Statement`] is a subject-predicate-object fact, optionally scoped to a
//! context (named graph). A [`StatementPattern`] matches statements with
//! wildcards on any position.

use super::types::{NamedNode, Resource, Value};
use std::fmt;

/// An RDF statement: a triple plus an optional context identifier.
///
/// `context: None` places the statement in the default graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    /// Subject
    pub subject: Resource,
    /// Predicate
    pub predicate: NamedNode,
    /// Object
    pub object: Value,
    /// Context (named graph), `None` for the default graph
    pub context: Option<Resource>,
}

impl Statement {
    /// Create a statement in the default graph
    pub fn new(subject: Resource, predicate: NamedNode, object: Value) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: None,
        }
    }

    /// Create a statement in a named graph
    pub fn with_context(
        subject: Resource,
        predicate: NamedNode,
        object: Value,
        context: Option<Resource>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            context,
        }
    }

    /// The triple part of this statement, ignoring its context
    pub fn to_default_graph(&self) -> Statement {
        Statement::new(
            self.subject.clone(),
            self.predicate.clone(),
            self.object.clone(),
        )
    }

    /// Check whether this statement belongs to one of the given contexts.
    ///
    /// An empty slice selects every context; a `None` entry selects the
    /// default graph.
    pub fn in_contexts(&self, contexts: &[Option<Resource>]) -> bool {
        contexts.is_empty() || contexts.iter().any(|c| c == &self.context)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(
                f,
                "{} {} {} {} .",
                self.subject, self.predicate, self.object, ctx
            ),
            None => write!(f, "{} {} {} .", self.subject, self.predicate, self.object),
        }
    }
}

/// A triple pattern with optional wildcards.
///
/// `None` on a position matches any term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPattern {
    /// Subject (`None` = any)
    pub subject: Option<Resource>,
    /// Predicate (`None` = any)
    pub predicate: Option<NamedNode>,
    /// Object (`None` = any)
    pub object: Option<Value>,
}

impl StatementPattern {
    /// Create a new pattern
    pub fn new(
        subject: Option<Resource>,
        predicate: Option<NamedNode>,
        object: Option<Value>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The wildcard pattern matching every statement
    pub fn any() -> Self {
        Self::default()
    }

    /// Check if a statement matches this pattern
    pub fn matches(&self, statement: &Statement) -> bool {
        if let Some(ref s) = self.subject {
            if s != &statement.subject {
                return false;
            }
        }
        if let Some(ref p) = self.predicate {
            if p != &statement.predicate {
                return false;
            }
        }
        if let Some(ref o) = self.object {
            if o != &statement.object {
                return false;
            }
        }
        true
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
    fn test_structural_equality() {
        assert_eq!(statement("a", "p", "b"), statement("a", "p", "b"));
        assert_ne!(statement("a", "p", "b"), statement("a", "p", "c"));

        // Context participates in equality
        let in_graph = Statement::with_context(
            example("a").into(),
            example("p"),
            example("b").into(),
            Some(example("g").into()),
        );
        assert_ne!(statement("a", "p", "b"), in_graph);
    }

    #[test]
    fn test_pattern_matching() {
        let st = statement("alice", "knows", "bob");

        assert!(StatementPattern::any().matches(&st));
        assert!(StatementPattern::new(Some(example("alice").into()), None, None).matches(&st));
        assert!(!StatementPattern::new(Some(example("carol").into()), None, None).matches(&st));
        assert!(
            StatementPattern::new(None, Some(example("knows")), Some(example("bob").into()))
                .matches(&st)
        );
    }

    #[test]
    fn test_context_selection() {
        let default = statement("a", "p", "b");
        let named = Statement::with_context(
            example("a").into(),
            example("p"),
            example("b").into(),
            Some(example("g").into()),
        );

        // Empty selection matches everything
        assert!(default.in_contexts(&[]));
        assert!(named.in_contexts(&[]));

        // None selects the default graph only
        assert!(default.in_contexts(&[None]));
        assert!(!named.in_contexts(&[None]));

        let g: Option<Resource> = Some(example("g").into());
        assert!(named.in_contexts(std::slice::from_ref(&g)));
        assert!(!default.in_contexts(std::slice::from_ref(&g)));
    }
}
