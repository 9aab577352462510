//! RDF term definitions
//!
//! Wrapper types around the oxrdf library for RDF primitives: IRIs, blank
//! nodes, literals, and the `Resource`/`Value` unions used as statement
//! subjects, contexts, and objects.

use oxrdf::{
    BlankNode as OxBlankNode, Literal as OxLiteral, NamedNode as OxNamedNode, NamedNodeRef,
};
use std::fmt;
use thiserror::Error;

/// RDF term errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid blank node identifier
    #[error("Invalid blank node: {0}")]
    InvalidBlankNode(String),

    /// Invalid literal
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedNode(OxNamedNode);

impl NamedNode {
    /// Create a new named node from an IRI string
    pub fn new(iri: &str) -> ModelResult<Self> {
        OxNamedNode::new(iri)
            .map(Self)
            .map_err(|e| ModelError::InvalidIri(e.to_string()))
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner oxrdf NamedNode
    pub fn inner(&self) -> &OxNamedNode {
        &self.0
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl From<OxNamedNode> for NamedNode {
    fn from(node: OxNamedNode) -> Self {
        Self(node)
    }
}

impl From<NamedNodeRef<'_>> for NamedNode {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self(node.into_owned())
    }
}

impl From<NamedNode> for OxNamedNode {
    fn from(node: NamedNode) -> Self {
        node.0
    }
}

/// Blank node (anonymous resource)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(OxBlankNode);

impl BlankNode {
    /// Create a new blank node with a unique identifier
    pub fn new() -> Self {
        Self(OxBlankNode::default())
    }

    /// Create a blank node from a string identifier
    pub fn from_identifier(id: &str) -> ModelResult<Self> {
        OxBlankNode::new(id)
            .map(Self)
            .map_err(|e| ModelError::InvalidBlankNode(e.to_string()))
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.as_str())
    }
}

impl From<OxBlankNode> for BlankNode {
    fn from(node: OxBlankNode) -> Self {
        Self(node)
    }
}

/// RDF literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(OxLiteral);

impl Literal {
    /// Create a simple literal (plain string)
    pub fn simple(value: impl Into<String>) -> Self {
        Self(OxLiteral::new_simple_literal(value))
    }

    /// Create a literal with a language tag
    pub fn language_tagged(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> ModelResult<Self> {
        OxLiteral::new_language_tagged_literal(value, language)
            .map(Self)
            .map_err(|e| ModelError::InvalidLiteral(e.to_string()))
    }

    /// Create a typed literal
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self(OxLiteral::new_typed_literal(value, datatype.0))
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Get the datatype IRI
    pub fn datatype(&self) -> NamedNode {
        NamedNode(self.0.datatype().into_owned())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lang) = self.language() {
            write!(f, "\"{}\"@{}", self.value(), lang)
        } else {
            write!(f, "\"{}\"^^{}", self.value(), self.datatype())
        }
    }
}

impl From<OxLiteral> for Literal {
    fn from(lit: OxLiteral) -> Self {
        Self(lit)
    }
}

/// Statement subject or context identifier: a named node or blank node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
}

impl Resource {
    /// Check if this is a named node
    pub fn is_named_node(&self) -> bool {
        matches!(self, Resource::NamedNode(_))
    }

    /// Get the named node if this resource is one
    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Resource::NamedNode(n) => Some(n),
            Resource::BlankNode(_) => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::NamedNode(n) => write!(f, "{}", n),
            Resource::BlankNode(b) => write!(f, "{}", b),
        }
    }
}

impl From<NamedNode> for Resource {
    fn from(node: NamedNode) -> Self {
        Resource::NamedNode(node)
    }
}

impl From<NamedNodeRef<'_>> for Resource {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Resource::NamedNode(node.into())
    }
}

impl From<BlankNode> for Resource {
    fn from(node: BlankNode) -> Self {
        Resource::BlankNode(node)
    }
}

/// Statement object: a named node, blank node, or literal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
}

impl Value {
    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Value::Literal(_))
    }

    /// Get the named node if this value is one
    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Value::NamedNode(n) => Some(n),
            _ => None,
        }
    }

    /// View this value as a resource, if it is not a literal
    pub fn as_resource(&self) -> Option<Resource> {
        match self {
            Value::NamedNode(n) => Some(Resource::NamedNode(n.clone())),
            Value::BlankNode(b) => Some(Resource::BlankNode(b.clone())),
            Value::Literal(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::NamedNode(n) => write!(f, "{}", n),
            Value::BlankNode(b) => write!(f, "{}", b),
            Value::Literal(l) => write!(f, "{}", l),
        }
    }
}

impl From<NamedNode> for Value {
    fn from(node: NamedNode) -> Self {
        Value::NamedNode(node)
    }
}

impl From<NamedNodeRef<'_>> for Value {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Value::NamedNode(node.into())
    }
}

impl From<BlankNode> for Value {
    fn from(node: BlankNode) -> Self {
        Value::BlankNode(node)
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::NamedNode(n) => Value::NamedNode(n),
            Resource::BlankNode(b) => Value::BlankNode(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node() {
        let node = NamedNode::new("http://example.org/alice").unwrap();
        assert_eq!(node.as_str(), "http://example.org/alice");
        assert_eq!(node.to_string(), "<http://example.org/alice>");
    }

    #[test]
    fn test_invalid_iri() {
        assert!(NamedNode::new("not an iri").is_err());
    }

    #[test]
    fn test_blank_node_uniqueness() {
        let node1 = BlankNode::new();
        let node2 = BlankNode::new();
        assert_ne!(node1, node2);
    }

    #[test]
    fn test_literal() {
        let lit = Literal::simple("Alice");
        assert_eq!(lit.value(), "Alice");
        assert_eq!(lit.language(), None);

        let lit = Literal::language_tagged("Alice", "en").unwrap();
        assert_eq!(lit.language(), Some("en"));
    }

    #[test]
    fn test_value_as_resource() {
        let iri: Value = NamedNode::new("http://example.org/x").unwrap().into();
        assert!(iri.as_resource().is_some());

        let lit: Value = Literal::simple("x").into();
        assert!(lit.as_resource().is_none());
        assert!(lit.is_literal());
    }

    #[test]
    fn test_vocab_conversion() {
        let ty: NamedNode = oxrdf::vocab::rdf::TYPE.into();
        assert_eq!(
            ty.as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
    }
}
