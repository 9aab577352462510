//! Incremental forward-chaining RDFS entailment
//!
//! Implements the RDF Semantics entailment rules plus the `X1` extension
//! for container membership properties. The engine keeps the store's
//! inferred statements closed under the rule set after every commit.

mod axioms;
mod engine;
mod rules;
mod tracker;

pub use engine::{InferencingConnection, RdfsInferencer};
pub use rules::{RuleId, RULE_COUNT};
pub use tracker::ChangeTracker;
