//! Quadstore
//!
//! An RDF quad store built around two subsystems:
//!
//! - a connection layer enforcing the lifecycle and concurrency contract
//!   every backend shares: shared/exclusive connection locking, serialized
//!   transactions with auto-start, and force-closeable result sequences;
//! - an incremental forward-chaining RDFS entailment engine that keeps the
//!   committed store closed under the RDF Semantics rule set.
//!
//! ## Example Usage
//!
//! ```rust
//! use quadstore::model::{NamedNode, Resource, Value};
//! use quadstore::store::MemoryStore;
//! use quadstore::inference::InferencingConnection;
//!
//! let con = InferencingConnection::new(MemoryStore::new()).unwrap();
//!
//! let employee = NamedNode::new("http://example.org/Employee").unwrap();
//! let person = NamedNode::new("http://example.org/Person").unwrap();
//! let alice = NamedNode::new("http://example.org/alice").unwrap();
//! let sub_class_of =
//!     NamedNode::new("http://www.w3.org/2000/01/rdf-schema#subClassOf").unwrap();
//! let rdf_type =
//!     NamedNode::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type").unwrap();
//!
//! con.add_statement(
//!     employee.clone().into(),
//!     sub_class_of,
//!     Value::from(person.clone()),
//!     &[],
//! )
//! .unwrap();
//! con.add_statement(alice.clone().into(), rdf_type.clone(), employee.into(), &[])
//!     .unwrap();
//! con.commit().unwrap();
//!
//! // Entailed: alice is also a Person
//! let types: Vec<_> = con
//!     .get_statements(
//!         Some(&Resource::from(alice)),
//!         Some(&rdf_type),
//!         Some(&Value::from(person)),
//!         true,
//!         &[],
//!     )
//!     .unwrap()
//!     .collect();
//! assert_eq!(types.len(), 1);
//! con.close().unwrap();
//! ```

#![warn(clippy::all)]

pub mod inference;
pub mod model;
pub mod store;

// Re-export main types for convenience
pub use inference::{ChangeTracker, InferencingConnection, RdfsInferencer, RuleId};

pub use model::{
    BlankNode, Literal, ModelError, ModelResult, NamedNode, Resource, Statement, StatementPattern,
    StatementSet, Value,
};

pub use store::{
    BindingSet, Connection, ConnectionListener, InferenceSupport, MemoryStore, PatternElement,
    PatternQuery, QueryPattern, StatementStore, StoreError, StoreResult, TrackedIteration,
    Variable,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
