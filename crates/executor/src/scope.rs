//! Transaction scopes
//!
//! A [`TransactionScope`] owns exactly one adapter transaction handle.
//! Opening the scope begins the transaction, so a scope is `Begun` from the
//! moment it exists:
//!
//! ```text
//! Begun ──commit──▶ Committed ──┐
//!   │                           ├──release──▶ Disposed
//!   └───rollback──▶ RolledBack ─┘
//! ```
//!
//! `Disposed` is reachable from every state. Releasing happens exactly once,
//! through [`TransactionScope::dispose`] or on drop.
//!
//! # Error asymmetry
//!
//! Commit and rollback errors propagate to the caller. A failure while
//! releasing the handle is logged at `warn` and swallowed, so cleanup never
//! masks the error that led to it.
//!
//! # Thread Safety
//!
//! A scope is meant for sequential use by its owner. It is `Send` but not
//! `Sync`.

use std::sync::Arc;

use rowgate_core::{
    Error, Operation, Result, Row, ScopeState, StorageAdapter, TransactionHandle, TxnId,
};
use tracing::{debug, info, warn};

use crate::context::ExecutionContext;
use crate::diff::plan_update;
use crate::mediator::TxnCounters;

/// Per-scope settings handed down by the [`Mediator`](crate::Mediator)
#[derive(Default)]
pub(crate) struct ScopeOptions {
    pub(crate) trace: bool,
    pub(crate) counters: Option<Arc<TxnCounters>>,
}

/// Execution context bound to one adapter transaction
pub struct TransactionScope {
    adapter: Arc<dyn StorageAdapter>,
    handle: Option<Box<dyn TransactionHandle>>,
    id: TxnId,
    name: Option<String>,
    state: ScopeState,
    options: ScopeOptions,
}

impl TransactionScope {
    /// Begin an unnamed transaction on `adapter`.
    ///
    /// # Errors
    ///
    /// [`Error::AdapterUnsupported`] when the adapter has no transaction
    /// capability; no adapter call is made in that case.
    pub fn begin(adapter: Arc<dyn StorageAdapter>) -> Result<Self> {
        Self::open(adapter, None, ScopeOptions::default())
    }

    /// Begin a named transaction on `adapter`
    pub fn begin_named(adapter: Arc<dyn StorageAdapter>, name: impl Into<String>) -> Result<Self> {
        Self::open(adapter, Some(name.into()), ScopeOptions::default())
    }

    pub(crate) fn open(
        adapter: Arc<dyn StorageAdapter>,
        name: Option<String>,
        options: ScopeOptions,
    ) -> Result<Self> {
        let transactional = adapter
            .as_transactional()
            .ok_or_else(|| Error::AdapterUnsupported {
                capability: "transactions".to_string(),
            })?;
        let handle = transactional
            .begin_transaction(name.as_deref())
            .map_err(|e| Error::from_adapter(Operation::Begin, name.as_deref().unwrap_or(""), e))?;

        let id = handle.id();
        let name = handle.name().map(str::to_string).or(name);
        debug!(target: "rowgate::txn", txn = %id, name = ?name, adapter = adapter.name(), "Transaction begun");

        if let Some(counters) = &options.counters {
            counters.record_begin();
        }

        Ok(Self {
            adapter,
            handle: Some(handle),
            id,
            name,
            state: ScopeState::Begun,
            options,
        })
    }

    /// Adapter-assigned transaction id
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Name given at begin (or assigned by the adapter)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Whether row operations are still allowed
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Commit the transaction.
    ///
    /// Always delegates to the handle: committing twice, or after a
    /// rollback, surfaces the adapter's error.
    pub fn commit(&mut self) -> Result<()> {
        let id = self.id;
        let handle = self.live_handle()?;
        match handle.commit() {
            Ok(()) => {
                info!(target: "rowgate::txn", txn = %id, "Transaction committed");
                self.finish(ScopeState::Committed);
                Ok(())
            }
            Err(e) => {
                warn!(target: "rowgate::txn", txn = %id, error = %e, "Commit failed");
                Err(Error::from_adapter(Operation::Commit, &id.to_string(), e))
            }
        }
    }

    /// Roll the transaction back.
    ///
    /// Same delegation rule as [`commit`](Self::commit).
    pub fn rollback(&mut self) -> Result<()> {
        let id = self.id;
        let handle = self.live_handle()?;
        match handle.rollback() {
            Ok(()) => {
                info!(target: "rowgate::txn", txn = %id, "Transaction rolled back");
                self.finish(ScopeState::RolledBack);
                Ok(())
            }
            Err(e) => {
                warn!(target: "rowgate::txn", txn = %id, error = %e, "Rollback failed");
                Err(Error::from_adapter(Operation::Rollback, &id.to_string(), e))
            }
        }
    }

    /// Release the transaction resource now.
    ///
    /// Equivalent to dropping the scope. A release failure is logged, never
    /// returned.
    pub fn dispose(mut self) {
        self.release();
    }

    /// Diff-based update of the rows identified by `original`.
    ///
    /// Writes only the fields of `new` that differ from `original`. When
    /// nothing differs the update is still delegated with an empty row; the
    /// adapter decides what that means.
    pub fn update_diff(&self, target: &str, new: &Row, original: &Row) -> Result<u64> {
        let plan = plan_update(target, new, original)?;
        if plan.is_noop() {
            debug!(target: "rowgate::exec", collection = %target, txn = %self.id, "Diff update with no changed fields");
        }
        ExecutionContext::update(self, target, plan.changes, &plan.criteria)
    }

    /// Diff-based update over paired lists, applied in order.
    ///
    /// Returns the summed affected count. Failures are not isolated: the
    /// first failing pair aborts the batch and its error is returned.
    ///
    /// # Errors
    ///
    /// [`Error::BatchLengthMismatch`] when the lists differ in length, before
    /// any adapter call.
    pub fn update_many_diff(&self, target: &str, new: &[Row], original: &[Row]) -> Result<u64> {
        if new.len() != original.len() {
            return Err(Error::BatchLengthMismatch {
                new: new.len(),
                original: original.len(),
            });
        }
        let mut affected = 0;
        for (new_row, original_row) in new.iter().zip(original) {
            affected += self.update_diff(target, new_row, original_row)?;
        }
        Ok(affected)
    }

    fn live_handle(&mut self) -> Result<&mut Box<dyn TransactionHandle>> {
        let state = self.state;
        self.handle
            .as_mut()
            .ok_or(Error::ScopeClosed { state })
    }

    fn finish(&mut self, next: ScopeState) {
        if self.state.is_active() {
            if let Some(counters) = &self.options.counters {
                counters.record_end(next);
            }
        }
        self.state = next;
    }

    fn release(&mut self) {
        let mut handle = match self.handle.take() {
            Some(handle) => handle,
            None => return,
        };
        if self.state.is_active() {
            debug!(target: "rowgate::txn", txn = %self.id, "Scope released without commit or rollback");
        }
        if let Err(e) = handle.dispose() {
            warn!(target: "rowgate::txn", txn = %self.id, error = %e, "Transaction dispose failed");
        }
        self.finish(ScopeState::Disposed);
    }
}

impl ExecutionContext for TransactionScope {
    fn adapter(&self) -> &dyn StorageAdapter {
        self.adapter.as_ref()
    }

    fn transaction(&self) -> Result<Option<&dyn TransactionHandle>> {
        match (&self.handle, self.state) {
            (Some(handle), ScopeState::Begun) => Ok(Some(&**handle)),
            (_, state) => Err(Error::ScopeClosed { state }),
        }
    }

    fn trace_operations(&self) -> bool {
        self.options.trace
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}
