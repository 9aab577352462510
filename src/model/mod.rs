//! RDF data model
//!
//! Terms (named nodes, blank nodes, literals), statements (triples/quads),
//! statement patterns, and the duplicate-free statement sets used as
//! inference delta buffers.

mod set;
mod statement;
mod types;

pub use set::StatementSet;
pub use statement::{Statement, StatementPattern};
pub use types::{BlankNode, Literal, ModelError, ModelResult, NamedNode, Resource, Value};
