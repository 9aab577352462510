//! Minimal query surface behind the `evaluate` contract
//!
//! Query parsing and optimization are out of scope; a query reaches the
//! backend as an already-built conjunction of triple patterns over
//! variables, and evaluation produces a sequence of binding sets.

use crate::model::{NamedNode, Resource, Value};
use indexmap::IndexMap;
use std::fmt;

/// A query variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Create a new variable
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The variable name, without a leading `?`
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

/// A pattern position: either a bound term or a variable
#[derive(Debug, Clone)]
pub enum PatternElement<T> {
    /// A concrete term that must match exactly
    Term(T),
    /// A variable to be bound by evaluation
    Variable(Variable),
}

impl<T> PatternElement<T> {
    /// Get the variable if this element is one
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            PatternElement::Variable(v) => Some(v),
            PatternElement::Term(_) => None,
        }
    }
}

/// One triple pattern of a query
#[derive(Debug, Clone)]
pub struct QueryPattern {
    /// Subject position
    pub subject: PatternElement<Resource>,
    /// Predicate position
    pub predicate: PatternElement<NamedNode>,
    /// Object position
    pub object: PatternElement<Value>,
}

impl QueryPattern {
    /// Create a new pattern
    pub fn new(
        subject: PatternElement<Resource>,
        predicate: PatternElement<NamedNode>,
        object: PatternElement<Value>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// A conjunctive query: every pattern must match, sharing variables
#[derive(Debug, Clone, Default)]
pub struct PatternQuery {
    /// The patterns, joined on shared variables
    pub patterns: Vec<QueryPattern>,
}

impl PatternQuery {
    /// Create a query from a list of patterns
    pub fn new(patterns: Vec<QueryPattern>) -> Self {
        Self { patterns }
    }
}

/// A set of variable-to-value bindings produced by query evaluation.
///
/// Bindings iterate in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSet {
    bindings: IndexMap<Variable, Value>,
}

impl BindingSet {
    /// Create an empty binding set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value bound to a variable name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(&Variable::new(name))
    }

    /// Bind a variable. Returns the previous value, if any.
    pub fn set(&mut self, variable: Variable, value: Value) -> Option<Value> {
        self.bindings.insert(variable, value)
    }

    /// Get the value bound to a variable
    pub fn value(&self, variable: &Variable) -> Option<&Value> {
        self.bindings.get(variable)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over the bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Value)> {
        self.bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_set() {
        let mut bindings = BindingSet::new();
        assert!(bindings.is_empty());

        let value: Value = NamedNode::new("http://example.org/x").unwrap().into();
        assert!(bindings.set(Variable::new("x"), value.clone()).is_none());
        assert_eq!(bindings.get("x"), Some(&value));
        assert_eq!(bindings.get("y"), None);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_variable_display() {
        assert_eq!(Variable::new("type").to_string(), "?type");
    }
}
