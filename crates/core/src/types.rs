//! Shared identifier and command types
//!
//! - [`TxnId`]: adapter-assigned transaction identifier
//! - [`Operation`]: which mediator operation produced an error or log event
//! - [`FunctionCall`] / [`FunctionOutcome`]: the adapter-specific command escape hatch

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Transaction identifier assigned by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Create a transaction ID from a raw value
    pub fn new(id: u64) -> Self {
        TxnId(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Operation kind, attached to errors and log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `find` / `find_one`
    Find,
    /// `get` by key
    Get,
    /// Single-row insert
    Insert,
    /// Bulk insert with per-row isolation
    InsertMany,
    /// Criteria update (including diff updates)
    Update,
    /// Batched update
    UpdateMany,
    /// Single-row upsert
    Upsert,
    /// Bulk upsert with per-row isolation
    UpsertMany,
    /// Criteria delete
    Delete,
    /// Adapter-specific command
    ExecuteFunction,
    /// Transaction begin
    Begin,
    /// Transaction commit
    Commit,
    /// Transaction rollback
    Rollback,
    /// Transaction resource release
    Dispose,
}

impl Operation {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Get => "get",
            Operation::Insert => "insert",
            Operation::InsertMany => "insert_many",
            Operation::Update => "update",
            Operation::UpdateMany => "update_many",
            Operation::Upsert => "upsert",
            Operation::UpsertMany => "upsert_many",
            Operation::Delete => "delete",
            Operation::ExecuteFunction => "execute_function",
            Operation::Begin => "begin",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
            Operation::Dispose => "dispose",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction scope lifecycle state
///
/// A scope is created and begun in one step, so there is no observable
/// "created" state: `Begun -> {Committed | RolledBack} -> Disposed`, with
/// `Disposed` reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeState {
    /// Transaction open; row operations allowed
    Begun,
    /// Commit succeeded
    Committed,
    /// Rollback succeeded
    RolledBack,
    /// Resource released
    Disposed,
}

impl ScopeState {
    /// Whether row operations are allowed
    pub fn is_active(&self) -> bool {
        matches!(self, ScopeState::Begun)
    }
}

impl fmt::Display for ScopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScopeState::Begun => "begun",
            ScopeState::Committed => "committed",
            ScopeState::RolledBack => "rolled back",
            ScopeState::Disposed => "disposed",
        })
    }
}

/// Named adapter-specific command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Command name, interpreted by the adapter
    pub name: String,
    /// Positional arguments
    pub args: Vec<Value>,
}

impl FunctionCall {
    /// Create a call with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Result of an adapter-specific command
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionOutcome {
    /// The adapter does not know this command
    Unsupported,
    /// The command ran and produced a value
    Completed(Value),
}

impl FunctionOutcome {
    /// `true` when the adapter ran the command
    pub fn is_success(&self) -> bool {
        matches!(self, FunctionOutcome::Completed(_))
    }

    /// The produced value, if the command ran
    pub fn value(&self) -> Option<&Value> {
        match self {
            FunctionOutcome::Completed(v) => Some(v),
            FunctionOutcome::Unsupported => None,
        }
    }

    /// Split into the `(success, result)` pair
    pub fn into_parts(self) -> (bool, Option<Value>) {
        match self {
            FunctionOutcome::Completed(v) => (true, Some(v)),
            FunctionOutcome::Unsupported => (false, None),
        }
    }
}
