//! Core types and traits for rowgate
//!
//! This crate defines the vocabulary shared by the mediator and storage
//! adapters:
//! - Value: tagged field value (null, bool, int, float, string, bytes, nested row)
//! - Row: ordered, schema-less field mapping
//! - Criteria: opaque predicate tree
//! - Error / AdapterError: error hierarchy
//! - RowErrorHandler: per-row failure contract for bulk operations
//! - Traits: StorageAdapter, TransactionalAdapter, TransactionHandle

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callback;
pub mod criteria;
pub mod error;
pub mod row;
pub mod traits;
pub mod types;
pub mod value;

pub use callback::{FailureLog, RowErrorHandler, RowFailure};
pub use criteria::Criteria;
pub use error::{AdapterError, AdapterResult, Error, Result};
pub use row::Row;
pub use traits::{
    isolate_rows, AdapterErrorSink, RowStream, StorageAdapter, TransactionHandle,
    TransactionalAdapter,
};
pub use types::{FunctionCall, FunctionOutcome, Operation, ScopeState, TxnId};
pub use value::Value;
