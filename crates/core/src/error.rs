//! Error types for rowgate
//!
//! Two layers, both built with `thiserror`:
//! - [`AdapterError`]: what a storage adapter reports natively
//! - [`Error`]: what the mediator reports to callers, with operation context
//!
//! Per-row failures inside `insert_many` / `upsert_many` never surface as
//! an [`Error`] return value; they are delivered to the caller's
//! [`RowErrorHandler`](crate::callback::RowErrorHandler) instead.

use thiserror::Error;

use crate::types::{Operation, ScopeState};

/// Result type alias for mediator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for adapter operations
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Native adapter failures
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Target collection does not exist
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// Uniqueness or other constraint rejected the write
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction handle already committed, rolled back or released
    #[error("transaction is no longer active: {0}")]
    TransactionInactive(String),

    /// The adapter lacks the requested capability
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Malformed request (missing key field, bad argument, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Backend-specific failure
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AdapterError {
    /// Wrap any backend error
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        AdapterError::Backend(Box::new(err))
    }
}

/// Mediator errors returned to callers
#[derive(Debug, Error)]
pub enum Error {
    /// Requested capability is absent from the adapter
    #[error("adapter does not support {capability}")]
    AdapterUnsupported {
        /// Missing capability
        capability: String,
    },

    /// Adapter-native error with operation context
    #[error("{operation} on '{target}' failed: {source}")]
    AdapterExecutionFailed {
        /// Operation that failed
        operation: Operation,
        /// Target collection (or transaction id for lifecycle operations)
        target: String,
        /// Native adapter error
        #[source]
        source: AdapterError,
    },

    /// Row operation issued against a scope that is no longer begun
    #[error("transaction scope is {state}; row operations require a begun scope")]
    ScopeClosed {
        /// Current scope state
        state: ScopeState,
    },

    /// Paired new/original lists differ in length
    #[error("batch length mismatch: {new} new rows, {original} original rows")]
    BatchLengthMismatch {
        /// Number of new rows
        new: usize,
        /// Number of original rows
        original: usize,
    },

    /// Diff update with an empty original row
    #[error("diff update on '{target}' needs at least one original field to identify rows")]
    EmptyIdentity {
        /// Target collection
        target: String,
    },

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Attach operation context to an adapter error.
    ///
    /// `AdapterError::Unsupported` becomes [`Error::AdapterUnsupported`];
    /// everything else becomes [`Error::AdapterExecutionFailed`].
    pub fn from_adapter(operation: Operation, target: &str, err: AdapterError) -> Self {
        match err {
            AdapterError::Unsupported(capability) => Error::AdapterUnsupported { capability },
            source => Error::AdapterExecutionFailed {
                operation,
                target: target.to_string(),
                source,
            },
        }
    }

    /// The wrapped adapter error, if any
    pub fn adapter_error(&self) -> Option<&AdapterError> {
        match self {
            Error::AdapterExecutionFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The failed operation, if known
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::AdapterExecutionFailed { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Whether this is a missing-capability error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::AdapterUnsupported { .. })
    }
}
