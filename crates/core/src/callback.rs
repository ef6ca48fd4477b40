//! Per-row error callback contract for bulk operations
//!
//! `insert_many` and `upsert_many` isolate row failures: a failing row is
//! handed to a [`RowErrorHandler`] and left out of the output, and the
//! batch carries on. Handlers are invoked in input order.
//!
//! Any `FnMut(RowFailure)` closure is a handler. [`FailureLog`] collects
//! failures for later inspection.

use crate::error::Error;
use crate::row::Row;
use crate::types::Operation;

/// A row that failed inside a bulk operation
#[derive(Debug)]
pub struct RowFailure {
    /// Target collection
    pub target: String,
    /// Bulk operation that was running
    pub operation: Operation,
    /// The input row exactly as the adapter reported it
    pub row: Row,
    /// Cause, with operation context attached
    pub error: Error,
}

/// Receiver for per-row failures
pub trait RowErrorHandler {
    /// Called once per failed row, in input order
    fn on_row_error(&mut self, failure: RowFailure);
}

impl<F> RowErrorHandler for F
where
    F: FnMut(RowFailure),
{
    fn on_row_error(&mut self, failure: RowFailure) {
        self(failure)
    }
}

/// Handler that records every failure
#[derive(Debug, Default)]
pub struct FailureLog {
    failures: Vec<RowFailure>,
}

impl FailureLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded failures, in input order
    pub fn failures(&self) -> &[RowFailure] {
        &self.failures
    }

    /// Number of recorded failures
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether nothing failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Take ownership of the recorded failures
    pub fn into_failures(self) -> Vec<RowFailure> {
        self.failures
    }
}

impl RowErrorHandler for FailureLog {
    fn on_row_error(&mut self, failure: RowFailure) {
        self.failures.push(failure);
    }
}
