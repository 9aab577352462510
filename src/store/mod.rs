//! Statement storage and connection management
//!
//! The [`StatementStore`] trait is the backend seam; [`Connection`] wraps a
//! backend handle with the locking, transaction, and result-sequence
//! lifecycle every session must honor. [`MemoryStore`] is the in-memory
//! reference backend.

mod backend;
mod connection;
mod error;
mod iteration;
mod memory;
mod query;

pub use backend::{
    BindingIter, ConnectionListener, InferenceSupport, NamespaceIter, ResourceIter, StatementIter,
    StatementStore,
};
pub use connection::Connection;
pub use error::{StoreError, StoreResult};
pub use iteration::TrackedIteration;
pub use memory::MemoryStore;
pub use query::{BindingSet, PatternElement, PatternQuery, QueryPattern, Variable};
