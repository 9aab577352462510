//! Store error taxonomy
//!
//! Backend failures are propagated verbatim and leave the connection usable;
//! operations on a closed connection are programmer errors; failed lock
//! acquisition is surfaced as a store error, never silently swallowed.

use crate::model::ModelError;
use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend I/O or constraint failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Operation attempted on a closed connection
    #[error("Connection has been closed")]
    ConnectionClosed,

    /// Lock acquisition failed or was poisoned
    #[error("Lock acquisition failed: {0}")]
    Lock(String),

    /// Invalid RDF term
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type StoreResult<T> = Result<T, StoreError>;
